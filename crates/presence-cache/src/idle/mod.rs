//! Idle-deferral scheduling module.

mod interaction_queue;

pub use interaction_queue::{InteractionGuard, InteractionQueue};
