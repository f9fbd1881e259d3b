// Messaging module - Message types, handler registry and routing
pub mod event;
pub mod registry;
pub mod router;

pub use event::MessageType;
pub use registry::{Handler, HandlerRegistry, SubscriptionKey, handler};
pub use router::MessageRouter;
