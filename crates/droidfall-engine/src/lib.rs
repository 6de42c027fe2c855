//! # Droidfall Engine
//!
//! Headless driver for the droid simulation.
//!
//! This crate ties the gameplay crate to:
//! - TOML configuration (`droidfall.toml`)
//! - A fixed-step simulation clock
//! - A scripted arena with in-memory collaborators

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod config;
pub mod timing;
