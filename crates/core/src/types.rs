use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{
    context::ContextSnapshot,
    events::{CanonicalEventType, RawEvent},
    identity::{SessionToken, VisitorIdentity},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalLineItem {
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub variant: Option<String>,
    pub quantity: u32,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl CanonicalLineItem {
    pub fn line_total(&self) -> f64 {
        self.price.unwrap_or(0.0) * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageContext {
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub title: Option<String>,
    pub location: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceContext {
    pub viewport: Dimensions,
    pub screen: Dimensions,
}

/// Payment-info events carry the value as text, every other type as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MonetaryValue {
    Amount(f64),
    Text(String),
}

/// Fields attached only for the canonical types that call for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommerceFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<MonetaryValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CanonicalLineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
}

/// Normalized record sent to the collection endpoint. Built once per event
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalEvent {
    pub event_type: CanonicalEventType,
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    pub shop: String,
    pub muid: VisitorIdentity,
    pub session_id: SessionToken,
    pub event_id: Option<String>,
    pub client_id: Option<String>,
    pub customer_id: Option<String>,
    pub event_timestamp: Option<String>,
    pub user_agent: Option<String>,
    pub pixel_id: Option<String>,
    pub host_session_id: Option<String>,
    pub page: PageContext,
    #[serde(flatten)]
    pub device: DeviceContext,
    pub context: ContextSnapshot,
    #[serde(flatten)]
    pub commerce: CommerceFields,
    pub event_data: RawEvent,
}
