pub mod event_type;
pub mod hub;
pub mod hub_builder;
pub mod raw;

pub use event_type::*;
pub use hub::*;
pub use hub_builder::*;
pub use raw::RawEvent;
