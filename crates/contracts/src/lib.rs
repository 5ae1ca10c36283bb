//! # Contracts
//!
//! Frozen interface contracts shared by every rotsink crate: the destination
//! adapter trait, the unified error type and the serde configuration model.
//! Business crates depend on this crate only, never the reverse.
//!
//! ## Time Model
//! - Rotation buckets are `std::time::Duration` values measured against
//!   `SystemTime` wall-clock, so bucket and clock units cannot disagree

mod blueprint;
mod config;
mod error;
mod sink;
mod stats;

pub use blueprint::*;
pub use config::*;
pub use error::*;
pub use sink::*;
pub use stats::*;
