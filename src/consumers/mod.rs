// Consumers module - Feature-level feeds built on the binder
pub mod exercise_progress;
pub mod multi_channel;

pub use exercise_progress::{ExerciseProgressFeed, exercise_progress_channel, parse_exercise_id};
pub use multi_channel::MultiChannelFeed;
