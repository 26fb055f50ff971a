//! Data models for the shift scheduling backend.
//!
//! Field names serialize as camelCase to match the scheduling frontend.

mod holiday;
mod shift;
mod statistics;
mod user;

pub use holiday::*;
pub use shift::*;
pub use statistics::*;
pub use user::*;
