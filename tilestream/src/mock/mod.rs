//! In-memory tile source and sink for testing
//!
//! ## Submodules
//! - `source`: a [`MockSource`] with configurable tiles, failures, metadata and latency,
//! - `sink`: a [`MockSink`] recording every write.

mod sink;
mod source;

pub use sink::*;
pub use source::*;
