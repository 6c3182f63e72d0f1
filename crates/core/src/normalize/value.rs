use crate::{
    events::RawEvent,
    normalize::fields::{amount_at, quantity_at, text_at},
    types::CanonicalLineItem,
};

pub const DEFAULT_CURRENCY: &str = "USD";

const CURRENCY_SOURCES: &[&str] = &[
    "/checkout/currencyCode",
    "/cart/cost/totalAmount/currencyCode",
    "/cartLine/cost/totalAmount/currencyCode",
    "/cartLine/merchandise/price/currencyCode",
    "/productVariant/price/currencyCode",
];

/// Total monetary value of the event. Explicit totals win over the sum of the
/// extracted line items; an event with neither is worth 0.
pub fn resolve_value(event: &RawEvent, line_items: &[CanonicalLineItem]) -> f64 {
    let payload = event.payload();

    amount_at(payload, "/checkout/totalPrice/amount")
        .or_else(|| amount_at(payload, "/cart/cost/totalAmount/amount"))
        .or_else(|| amount_at(payload, "/cartLine/cost/totalAmount/amount"))
        .or_else(|| {
            amount_at(payload, "/productVariant/price/amount")
                .map(|price| to_cents(price * f64::from(quantity_at(payload, "/quantity"))))
        })
        .unwrap_or_else(|| {
            to_cents(line_items.iter().map(CanonicalLineItem::line_total).sum())
        })
}

/// Computed totals are rounded to cents so float drift never reaches the wire.
fn to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn resolve_currency(event: &RawEvent) -> String {
    let payload = event.payload();

    CURRENCY_SOURCES
        .iter()
        .find_map(|pointer| text_at(payload, pointer))
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}
