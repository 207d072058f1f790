//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside memoized code.
//!
//! # Tasks
//! - Sweep: drops expired results and scopes of dropped owners

mod sweep;

pub use sweep::spawn_sweep_task;
