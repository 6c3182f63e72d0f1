use chrono::Utc;

use crate::{
    context::ContextSnapshot,
    events::{CanonicalEventType, RawEvent},
    format::format_amount,
    identity::{SessionToken, VisitorIdentity},
    normalize::fields::{amount_at, text_at},
    types::{CanonicalEvent, CanonicalLineItem, CommerceFields, MonetaryValue},
};

/// Activation-wide values merged into every event.
#[derive(Debug, Clone)]
pub struct Correlation {
    pub shop: String,
    pub identity: VisitorIdentity,
    pub session: SessionToken,
    pub context: ContextSnapshot,
}

/// Values derived from the raw event by the extractor and resolvers.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub line_items: Vec<CanonicalLineItem>,
    pub value: f64,
    pub currency: String,
}

pub fn build_canonical_event(
    raw: &RawEvent,
    event_type: CanonicalEventType,
    derived: Derived,
    correlation: &Correlation,
) -> CanonicalEvent {
    CanonicalEvent {
        event_type,
        event_name: raw.name().to_string(),
        timestamp: Utc::now(),
        shop: correlation.shop.clone(),
        muid: correlation.identity.clone(),
        session_id: correlation.session.clone(),
        event_id: raw.id(),
        client_id: raw.client_id(),
        customer_id: raw.customer_id(),
        event_timestamp: raw.timestamp(),
        user_agent: raw.user_agent(),
        pixel_id: raw.pixel_label(),
        host_session_id: raw.host_session_id(),
        page: raw.page(),
        device: raw.device(),
        context: correlation.context.clone(),
        commerce: commerce_fields(raw, event_type, derived),
        event_data: raw.clone(),
    }
}

fn commerce_fields(
    raw: &RawEvent,
    event_type: CanonicalEventType,
    derived: Derived,
) -> CommerceFields {
    use CanonicalEventType::*;

    let payload = raw.payload();
    let Derived {
        line_items,
        value,
        currency,
    } = derived;

    match event_type {
        AddToCart | RemoveFromCart | ViewCart | ViewItem => CommerceFields {
            value: Some(MonetaryValue::Amount(value)),
            currency: Some(currency),
            items: Some(line_items),
            ..Default::default()
        },
        Purchase | BeginCheckout => CommerceFields {
            value: Some(MonetaryValue::Amount(value)),
            currency: Some(currency),
            items: Some(line_items),
            transaction_id: (event_type == Purchase)
                .then(|| text_at(payload, "/checkout/token").or_else(|| raw.id()))
                .flatten(),
            tax: amount_at(payload, "/checkout/totalTax/amount"),
            shipping: amount_at(payload, "/checkout/shippingLine/price/amount"),
            ..Default::default()
        },
        Search => CommerceFields {
            search_term: text_at(payload, "/searchResult/query")
                .or_else(|| text_at(payload, "/searchQuery")),
            ..Default::default()
        },
        AddPaymentInfo => CommerceFields {
            value: Some(MonetaryValue::Text(format_amount(value))),
            currency: Some(currency),
            items: Some(line_items),
            payment_type: text_at(payload, "/checkout/transactions/0/paymentMethod/type")
                .or_else(|| text_at(payload, "/checkout/transactions/0/gateway")),
            ..Default::default()
        },
        AddShippingInfo | AddContactInfo | ViewItemList | PageView | SignUp | Login
        | CustomEvent | ViewContent => CommerceFields::default(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::identity::new_session_token;

    fn correlation() -> Correlation {
        Correlation {
            shop: "test-shop".to_string(),
            identity: VisitorIdentity::new("visitor-1"),
            session: new_session_token(),
            context: ContextSnapshot::default(),
        }
    }

    fn build(raw: &RawEvent, event_type: CanonicalEventType, value: f64) -> CanonicalEvent {
        let derived = Derived {
            line_items: Vec::new(),
            value,
            currency: "EUR".to_string(),
        };
        build_canonical_event(raw, event_type, derived, &correlation())
    }

    #[test]
    fn purchase_prefers_checkout_token() {
        let raw = RawEvent::new(json!({
            "id": "evt_1",
            "name": "checkout_completed",
            "data": {"checkout": {
                "token": "tok_1",
                "totalTax": {"amount": "3.10"},
                "shippingLine": {"price": {"amount": "bad"}}
            }}
        }));

        let event = build(&raw, CanonicalEventType::Purchase, 42.5);

        assert_eq!(event.commerce.transaction_id.as_deref(), Some("tok_1"));
        assert_eq!(event.commerce.tax, Some(3.1));
        assert_eq!(event.commerce.shipping, None);
        assert_eq!(event.commerce.value, Some(MonetaryValue::Amount(42.5)));
        assert_eq!(event.shop, "test-shop");
        assert_eq!(event.muid.as_str(), "visitor-1");
    }

    #[test]
    fn purchase_falls_back_to_event_id() {
        let raw = RawEvent::new(json!({"id": "evt_9", "name": "checkout_completed"}));
        let event = build(&raw, CanonicalEventType::Purchase, 0.0);
        assert_eq!(event.commerce.transaction_id.as_deref(), Some("evt_9"));
    }

    #[test]
    fn begin_checkout_has_no_transaction_id() {
        let raw = RawEvent::new(json!({
            "id": "evt_2",
            "data": {"checkout": {"token": "tok_2", "shippingLine": {"price": {"amount": "4.99"}}}}
        }));
        let event = build(&raw, CanonicalEventType::BeginCheckout, 10.0);

        assert_eq!(event.commerce.transaction_id, None);
        assert_eq!(event.commerce.shipping, Some(4.99));
    }

    #[test]
    fn search_term_from_either_field() {
        let nested = RawEvent::new(json!({"data": {"searchResult": {"query": "hats"}}}));
        let flat = RawEvent::new(json!({"data": {"searchQuery": "shoes"}}));

        for (raw, term) in [(nested, "hats"), (flat, "shoes")] {
            let event = build(&raw, CanonicalEventType::Search, 0.0);
            assert_eq!(event.commerce.search_term.as_deref(), Some(term));
            assert_eq!(event.commerce.value, None);
            assert_eq!(event.commerce.items, None);
        }
    }

    #[test]
    fn payment_info_value_is_text() {
        let raw = RawEvent::new(json!({
            "data": {"checkout": {"transactions": [{"gateway": "shopify_payments"}]}}
        }));
        let event = build(&raw, CanonicalEventType::AddPaymentInfo, 19.9);

        assert_eq!(
            event.commerce.value,
            Some(MonetaryValue::Text("19.90".to_string()))
        );
        assert_eq!(
            event.commerce.payment_type.as_deref(),
            Some("shopify_payments")
        );

        let body = serde_json::to_value(&event).unwrap();
        assert_eq!(body["value"], json!("19.90"));
    }

    #[test]
    fn other_types_carry_common_fields_only() {
        let raw = RawEvent::new(json!({
            "name": "page_viewed",
            "clientId": "client-1",
            "context": {"document": {"title": "Home"}}
        }));
        let event = build(&raw, CanonicalEventType::PageView, 5.0);

        assert_eq!(event.commerce, CommerceFields::default());
        assert_eq!(event.client_id.as_deref(), Some("client-1"));
        assert_eq!(event.page.title.as_deref(), Some("Home"));

        let body = serde_json::to_value(&event).unwrap();
        assert!(body.get("value").is_none());
        assert!(body.get("currency").is_none());
        assert_eq!(body["event_type"], json!("PageView"));
        assert_eq!(body["event_data"]["clientId"], json!("client-1"));
    }
}
