//! Streaming Module
//!
//! Everything between raw text/bytes and typed events:
//! - Frame reassembly (`event:`/`data:` lines, blank-line dispatch)
//! - The stateful decoder and its tool-call ledger
//! - UTF-8 safe byte decoding
//! - Frame encoding and `Stream` adapters

mod config;
mod decoder;
mod encoder;
mod ext;
mod frame;
mod ledger;
mod utf8;

pub use config::*;
pub use decoder::*;
pub use encoder::*;
pub use ext::*;
pub use frame::*;
pub use ledger::*;
pub use utf8::*;
