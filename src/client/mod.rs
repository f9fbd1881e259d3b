// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{ConnectionManagerBuilder, Endpoint, RealtimeOptions};
pub use connection::{ConnectionState, Transition};
pub use self::core::ConnectionManager;
pub use state::ManagerState;
