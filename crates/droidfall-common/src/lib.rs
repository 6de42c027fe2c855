//! # Droidfall Common
//!
//! Common types, utilities, and shared abstractions for Droidfall.
//!
//! This crate provides foundational types used by the gameplay core and
//! the headless engine:
//! - ID types (AgentId, NodeRef)
//! - Easing curves and sampled timers
//! - Vector sampling helpers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod easing;
pub mod error;
pub mod ids;
pub mod math;
pub mod timer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::easing::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
    pub use crate::timer::*;
}

pub use prelude::*;
