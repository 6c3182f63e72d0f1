use std::fmt;

use serde::Serialize;

/// Closed, vendor-neutral taxonomy of storefront actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CanonicalEventType {
    AddToCart,
    RemoveFromCart,
    ViewCart,
    BeginCheckout,
    Purchase,
    AddShippingInfo,
    AddContactInfo,
    AddPaymentInfo,
    ViewItem,
    ViewItemList,
    PageView,
    Search,
    SignUp,
    Login,
    CustomEvent,
    ViewContent,
}

impl CanonicalEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddToCart => "AddToCart",
            Self::RemoveFromCart => "RemoveFromCart",
            Self::ViewCart => "ViewCart",
            Self::BeginCheckout => "BeginCheckout",
            Self::Purchase => "Purchase",
            Self::AddShippingInfo => "AddShippingInfo",
            Self::AddContactInfo => "AddContactInfo",
            Self::AddPaymentInfo => "AddPaymentInfo",
            Self::ViewItem => "ViewItem",
            Self::ViewItemList => "ViewItemList",
            Self::PageView => "PageView",
            Self::Search => "Search",
            Self::SignUp => "SignUp",
            Self::Login => "Login",
            Self::CustomEvent => "CustomEvent",
            Self::ViewContent => "ViewContent",
        }
    }
}

impl fmt::Display for CanonicalEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source event name to canonical type.
pub const EVENT_TYPE_TABLE: &[(&str, CanonicalEventType)] = &[
    ("product_added_to_cart", CanonicalEventType::AddToCart),
    ("product_removed_from_cart", CanonicalEventType::RemoveFromCart),
    ("cart_viewed", CanonicalEventType::ViewCart),
    ("checkout_started", CanonicalEventType::BeginCheckout),
    ("checkout_completed", CanonicalEventType::Purchase),
    ("checkout_address_info_submitted", CanonicalEventType::AddShippingInfo),
    ("checkout_contact_info_submitted", CanonicalEventType::AddContactInfo),
    ("checkout_shipping_info_submitted", CanonicalEventType::AddShippingInfo),
    ("payment_info_submitted", CanonicalEventType::AddPaymentInfo),
    ("product_viewed", CanonicalEventType::ViewItem),
    ("collection_viewed", CanonicalEventType::ViewItemList),
    ("page_viewed", CanonicalEventType::PageView),
    ("search_submitted", CanonicalEventType::Search),
    ("customer_account_created", CanonicalEventType::SignUp),
    ("customer_logged_in", CanonicalEventType::Login),
    ("clicked", CanonicalEventType::CustomEvent),
    ("form_submitted", CanonicalEventType::CustomEvent),
    ("input_changed", CanonicalEventType::CustomEvent),
    ("input_focused", CanonicalEventType::CustomEvent),
    ("input_blurred", CanonicalEventType::CustomEvent),
    ("ui_extension_errored", CanonicalEventType::CustomEvent),
    ("alert_displayed", CanonicalEventType::CustomEvent),
];

/// Unknown names fall back to [`CanonicalEventType::ViewContent`].
pub fn map_event_type(source_name: &str) -> CanonicalEventType {
    EVENT_TYPE_TABLE
        .iter()
        .find(|(name, _)| *name == source_name)
        .map(|(_, event_type)| *event_type)
        .unwrap_or(CanonicalEventType::ViewContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_names() {
        assert_eq!(map_event_type("checkout_completed"), CanonicalEventType::Purchase);
        assert_eq!(map_event_type("search_submitted"), CanonicalEventType::Search);
        assert_eq!(
            map_event_type("product_removed_from_cart"),
            CanonicalEventType::RemoveFromCart
        );
        assert_eq!(
            map_event_type("payment_info_submitted"),
            CanonicalEventType::AddPaymentInfo
        );
    }

    #[test]
    fn unknown_names_fall_back_to_view_content() {
        for name in ["", "made_up", "CHECKOUT_COMPLETED", "all_events"] {
            assert_eq!(map_event_type(name), CanonicalEventType::ViewContent);
            assert_eq!(map_event_type(name), map_event_type(name));
        }
    }

    #[test]
    fn table_has_no_duplicate_names() {
        let mut names: Vec<_> = EVENT_TYPE_TABLE.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EVENT_TYPE_TABLE.len());
    }

    #[test]
    fn serializes_as_tag() {
        let json = serde_json::to_string(&CanonicalEventType::Purchase).unwrap();
        assert_eq!(json, "\"Purchase\"");
    }
}
