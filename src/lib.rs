//! # Classroom Realtime
//!
//! Real-time notification and presence session client for the classroom
//! management app. One WebSocket connection per application, bounded
//! fixed-delay reconnection, and handler fan-out keyed by message type or by
//! the channel named inside the payload.
//!
//! ## Example
//!
//! ```no_run
//! use classroom_realtime::{
//!     ConnectionManager, ExerciseProgressFeed, RealtimeOptions, SubscriptionBinder,
//! };
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ConnectionManager::new(RealtimeOptions::from_env())?;
//!     let binder = SubscriptionBinder::new(manager.clone());
//!
//!     let (_session, auth) = watch::channel(true);
//!     let _feed = ExerciseProgressFeed::bind(&binder, auth, 42, |progress| {
//!         println!("exercise 42 progress: {progress}");
//!     });
//!
//!     tokio::signal::ctrl_c().await?;
//!     manager.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod binder;
pub mod client;
pub mod consumers;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use binder::{BindCallbacks, BindingPhase, ScopedBinding, Subscription, SubscriptionBinder};
pub use client::{ConnectionManager, ConnectionState, Endpoint, RealtimeOptions};
pub use consumers::{ExerciseProgressFeed, MultiChannelFeed};
pub use infrastructure::Debouncer;
pub use messaging::{Handler, MessageType, SubscriptionKey, handler};
pub use types::{Envelope, RealtimeError, Result};
