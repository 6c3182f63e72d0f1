//! Pixeltap Core Library
//!
//! Normalizes storefront commerce events into a vendor-neutral analytics
//! schema and forwards them to a collection endpoint.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod format;
pub mod identity;
pub mod normalize;
pub mod settings;
pub mod store;
pub mod tap;
pub mod types;

// Re-export commonly used items at crate root
pub use context::{ContextSnapshot, DEFAULT_SIGNALS, capture_context};
pub use dispatch::{Dispatcher, HttpTransport, OutboundRequest, Transport};
pub use error::{Result, TapError};
pub use events::{
    ALL_EVENTS, Analytics, CanonicalEventType, EventHandler, EventHub, EventHubBuilder, RawEvent,
    map_event_type,
};
pub use format::{format_amount, format_event_summary};
pub use identity::{
    SessionToken, VisitorIdentity, generate_identifier, new_session_token,
    resolve_visitor_identity,
};
pub use normalize::{
    Correlation, Derived, build_canonical_event, extract_line_items, normalize, resolve_currency,
    resolve_value,
};
pub use settings::{ResolvedSettings, Settings};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use tap::{Host, Tap, TapStats, activate};
pub use types::{CanonicalEvent, CanonicalLineItem, CommerceFields, MonetaryValue};
