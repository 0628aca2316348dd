//! Bubbles Core - Foundational types for the Bubbles particle library
//!
//! This crate provides the types the simulation and renderer crates share:
//! - `Vec2` - 2D positions and velocities
//! - `Color` - RGB channels plus alpha, as handed to renderers
//! - Error types and Result alias

mod error;
mod types;

pub use error::{BubblesError, Result};
pub use types::{Color, Vec2};
