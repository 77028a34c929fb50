//! Types Module
//!
//! Data carried by decoded stream events.

mod events;
mod http;
mod tools;
mod usage;

pub use events::*;
pub use http::*;
pub use tools::*;
pub use usage::*;
