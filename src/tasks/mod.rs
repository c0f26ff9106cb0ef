//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Sweep: Removes expired and corrupt records from the cache directory

mod sweep;

pub use sweep::spawn_sweep_task;
