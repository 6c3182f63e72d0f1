use serde_json::Value;

use crate::{
    events::RawEvent,
    normalize::fields::{amount_at, array_at, object_at, quantity_at, text_at},
    types::CanonicalLineItem,
};

/// Known payload shapes that carry line items, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// `cartLine`: one cart line with a merchandise reference.
    CartLine,
    /// `productVariant`: one viewed variant, quantity from the payload root.
    ProductVariant,
    /// `cart.lines[]`: lines with merchandise references.
    CartLines,
    /// `checkout.lines[]`: lines with variant references.
    CheckoutLines,
    /// `checkout.lineItems[]`: same as [`LineShape::CheckoutLines`].
    CheckoutLineItems,
    /// `lines[]`: each entry has either reference.
    GenericLines,
}

impl LineShape {
    pub const PRECEDENCE: [LineShape; 6] = [
        LineShape::CartLine,
        LineShape::ProductVariant,
        LineShape::CartLines,
        LineShape::CheckoutLines,
        LineShape::CheckoutLineItems,
        LineShape::GenericLines,
    ];

    /// Candidate items for this shape; empty when the payload does not match.
    pub fn extract(self, payload: &Value) -> Vec<CanonicalLineItem> {
        match self {
            LineShape::CartLine => object_at(payload, "/cartLine")
                .and_then(merchandise_line)
                .into_iter()
                .collect(),
            LineShape::ProductVariant => object_at(payload, "/productVariant")
                .map(|variant| variant_item(variant, quantity_at(payload, "/quantity"), None))
                .into_iter()
                .collect(),
            LineShape::CartLines => array_at(payload, "/cart/lines")
                .iter()
                .filter_map(merchandise_line)
                .collect(),
            LineShape::CheckoutLines => array_at(payload, "/checkout/lines")
                .iter()
                .filter_map(variant_line)
                .collect(),
            LineShape::CheckoutLineItems => array_at(payload, "/checkout/lineItems")
                .iter()
                .filter_map(variant_line)
                .collect(),
            LineShape::GenericLines => array_at(payload, "/lines")
                .iter()
                .filter_map(either_line)
                .collect(),
        }
    }
}

/// Every matching shape contributes; shapes are not mutually exclusive and
/// items are not deduplicated. The initial-state cart is consulted only when
/// nothing matched. Items without an id are dropped.
pub fn extract_line_items(
    event: &RawEvent,
    initial_state: Option<&RawEvent>,
) -> Vec<CanonicalLineItem> {
    let payload = event.payload();
    let mut items: Vec<CanonicalLineItem> = LineShape::PRECEDENCE
        .iter()
        .flat_map(|shape| shape.extract(payload))
        .collect();

    if items.is_empty() {
        if let Some(state) = initial_state {
            items = array_at(state.payload(), "/cart/lines")
                .iter()
                .filter_map(either_line)
                .collect();
        }
    }

    items.retain(|item| !item.id.is_empty());
    items
}

fn merchandise_line(line: &Value) -> Option<CanonicalLineItem> {
    let merchandise = object_at(line, "/merchandise")?;
    Some(variant_item(merchandise, quantity_at(line, "/quantity"), None))
}

fn variant_line(line: &Value) -> Option<CanonicalLineItem> {
    let variant = object_at(line, "/variant")?;
    Some(variant_item(
        variant,
        quantity_at(line, "/quantity"),
        text_at(line, "/title"),
    ))
}

fn either_line(line: &Value) -> Option<CanonicalLineItem> {
    merchandise_line(line).or_else(|| variant_line(line))
}

fn variant_item(variant: &Value, quantity: u32, line_title: Option<String>) -> CanonicalLineItem {
    CanonicalLineItem {
        id: text_at(variant, "/id")
            .or_else(|| text_at(variant, "/product/id"))
            .unwrap_or_default(),
        name: line_title
            .or_else(|| text_at(variant, "/product/title"))
            .or_else(|| text_at(variant, "/title")),
        category: text_at(variant, "/product/type"),
        variant: text_at(variant, "/title"),
        quantity,
        price: amount_at(variant, "/price/amount"),
        description: text_at(variant, "/product/description"),
    }
}
