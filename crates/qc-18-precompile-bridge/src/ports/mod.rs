//! # Ports Layer
//!
//! Hexagonal architecture ports:
//! - `inbound`: driving port called by the interpreter
//! - `outbound`: driven ports for ledgers, module state and handlers

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
