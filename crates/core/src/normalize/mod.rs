//! Mapping of raw storefront events onto the canonical schema.

pub mod builder;
mod fields;
pub mod line_items;
pub mod value;

pub use builder::{Correlation, Derived, build_canonical_event};
pub use fields::parse_amount;
pub use line_items::{LineShape, extract_line_items};
pub use value::{DEFAULT_CURRENCY, resolve_currency, resolve_value};

use crate::{
    events::{RawEvent, map_event_type},
    types::CanonicalEvent,
};

/// Classify, extract, resolve and assemble one event.
pub fn normalize(
    raw: &RawEvent,
    initial_state: Option<&RawEvent>,
    correlation: &Correlation,
) -> CanonicalEvent {
    let event_type = map_event_type(raw.name());
    let line_items = extract_line_items(raw, initial_state);
    let derived = Derived {
        value: resolve_value(raw, &line_items),
        currency: resolve_currency(raw),
        line_items,
    };

    build_canonical_event(raw, event_type, derived, correlation)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        context::ContextSnapshot,
        events::CanonicalEventType,
        identity::{VisitorIdentity, new_session_token},
        types::MonetaryValue,
    };

    fn correlation() -> Correlation {
        Correlation {
            shop: "default".to_string(),
            identity: VisitorIdentity::new("v"),
            session: new_session_token(),
            context: ContextSnapshot::default(),
        }
    }

    #[test]
    fn checkout_completed_becomes_purchase() {
        let raw = RawEvent::new(json!({
            "id": "evt_1",
            "name": "checkout_completed",
            "data": {"checkout": {
                "totalPrice": {"amount": "42.50"},
                "currencyCode": "EUR",
                "token": "tok_1"
            }}
        }));

        let event = normalize(&raw, None, &correlation());

        assert_eq!(event.event_type, CanonicalEventType::Purchase);
        assert_eq!(event.commerce.value, Some(MonetaryValue::Amount(42.5)));
        assert_eq!(event.commerce.currency.as_deref(), Some("EUR"));
        assert_eq!(event.commerce.transaction_id.as_deref(), Some("tok_1"));
    }

    #[test]
    fn search_submitted_has_term_only() {
        let raw = RawEvent::new(json!({
            "name": "search_submitted",
            "data": {"searchQuery": "shoes"}
        }));

        let event = normalize(&raw, None, &correlation());

        assert_eq!(event.event_type, CanonicalEventType::Search);
        assert_eq!(event.commerce.search_term.as_deref(), Some("shoes"));
        assert_eq!(event.commerce.items, None);
        assert_eq!(event.commerce.value, None);
    }

    #[test]
    fn cart_view_falls_back_to_initial_cart() {
        let state = RawEvent::new(json!({
            "cart": {"lines": [
                {"quantity": 2, "merchandise": {"id": "gid://1", "price": {"amount": "3.00"}}}
            ]}
        }));
        let raw = RawEvent::new(json!({"name": "cart_viewed", "data": {}}));

        let event = normalize(&raw, Some(&state), &correlation());

        assert_eq!(event.event_type, CanonicalEventType::ViewCart);
        assert_eq!(event.commerce.items.as_ref().map(Vec::len), Some(1));
        assert_eq!(event.commerce.value, Some(MonetaryValue::Amount(6.0)));
        assert_eq!(event.commerce.currency.as_deref(), Some(DEFAULT_CURRENCY));
    }
}
