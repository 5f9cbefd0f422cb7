//! Backpressure-aware tile streaming.
//!
//! This crate turns a coordinate-indexed [`TileSource`] into a bounded stream and writes that
//! stream into a [`TileSink`]:
//! - [`TileProducer`] enumerates coordinates with a scheme and keeps at most
//!   [`StreamConfig::concurrency`] fetches in flight,
//! - every fetched tile travels downstream as a [`TileCarrier`] byte stream,
//! - [`TileCollector`] buffers each carrier into a [`TileRecord`],
//! - [`TileConsumer`] writes the records and negotiates the sink metadata.
//!
//! [`copy_tiles`] wires all stages together.
//!
//! ## Ordering
//! Tiles are fetched in scheme order but emitted in completion order, so with a concurrency
//! above one the output order is not the scan order.

mod carrier;
pub use carrier::*;

mod collector;
pub use collector::*;

mod config;
pub use config::*;

mod consumer;
pub use consumer::*;

mod events;
pub use events::*;

#[cfg(any(test, feature = "test"))]
mod mock;
#[cfg(any(test, feature = "test"))]
pub use mock::{MockSink, MockSinkCall, MockSinkTile, MockSource};

mod producer;
pub use producer::*;

mod streaming;
pub use streaming::*;

mod types;
pub use types::*;
