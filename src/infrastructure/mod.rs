// Infrastructure module - Background services and utilities
pub mod debounce;
pub mod heartbeat;
pub mod task_manager;
pub mod timer;

pub use debounce::Debouncer;
pub use heartbeat::HeartbeatManager;
pub use task_manager::TaskManager;
pub use timer::ReconnectTimer;
