use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{DeviceContext, Dimensions, PageContext};

/// Event exactly as the host delivered it. The shape varies by event name and
/// is never trusted: every accessor tolerates missing or mistyped fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Value);

impl RawEvent {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn id(&self) -> Option<String> {
        text_at(&self.0, "/id")
    }

    pub fn client_id(&self) -> Option<String> {
        text_at(&self.0, "/clientId")
    }

    pub fn customer_id(&self) -> Option<String> {
        text_at(&self.0, "/customerId")
    }

    pub fn timestamp(&self) -> Option<String> {
        text_at(&self.0, "/timestamp")
    }

    pub fn pixel_label(&self) -> Option<String> {
        text_at(&self.0, "/pixelEventLabel")
    }

    pub fn user_agent(&self) -> Option<String> {
        text_at(&self.0, "/context/navigator/userAgent")
    }

    pub fn host_session_id(&self) -> Option<String> {
        text_at(&self.0, "/context/session/id")
    }

    /// Commerce payload: the `data` object when present, otherwise the event
    /// itself.
    pub fn payload(&self) -> &Value {
        match self.0.get("data") {
            Some(data @ Value::Object(_)) => data,
            _ => &self.0,
        }
    }

    pub fn page(&self) -> PageContext {
        PageContext {
            url: text_at(&self.0, "/context/document/location/href")
                .or_else(|| text_at(&self.0, "/context/document/url")),
            referrer: text_at(&self.0, "/context/document/referrer"),
            title: text_at(&self.0, "/context/document/title"),
            location: self
                .0
                .pointer("/context/window/location")
                .filter(|v| !v.is_null())
                .cloned(),
        }
    }

    pub fn device(&self) -> DeviceContext {
        DeviceContext {
            viewport: Dimensions {
                width: dimension_at(&self.0, "/context/window/innerWidth"),
                height: dimension_at(&self.0, "/context/window/innerHeight"),
            },
            screen: Dimensions {
                width: dimension_at(&self.0, "/context/screen/width"),
                height: dimension_at(&self.0, "/context/screen/height"),
            },
        }
    }
}

impl From<Value> for RawEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Non-empty string at `pointer`; numbers are rendered as text.
pub(crate) fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn dimension_at(value: &Value, pointer: &str) -> Option<u32> {
    value
        .pointer(pointer)
        .and_then(Value::as_f64)
        .filter(|v| *v > 0.0)
        .map(|v| v as u32)
}
