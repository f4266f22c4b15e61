//! # Domain Layer (Inner Hexagon)
//!
//! Pure data and helpers for the precompile bridge.
//! NO I/O, NO global state.

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;
