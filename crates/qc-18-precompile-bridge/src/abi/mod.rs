//! # ABI Layer
//!
//! Word encoding, argument codec and event topics.
//!
//! - `word.rs` - single-word encoder for return values and topics
//! - `codec.rs` - head/tail ABI codec and revert payloads
//! - `topics.rs` - event declarations and log construction

pub mod codec;
pub mod topics;
pub mod word;

pub use codec::*;
pub use topics::*;
pub use word::*;
