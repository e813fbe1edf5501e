#![forbid(unsafe_code)]

//! Pure domain types for timed exam sessions.
//!
//! Nothing in this crate performs I/O or spawns tasks; the `services` crate
//! drives these types from its event queue.

pub mod model;
pub mod scoring;
pub mod time;

pub use time::Clock;
