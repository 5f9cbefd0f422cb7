//! Wiring of the pipeline stages, and streaming helpers for sources and sinks.
//!
//! [`copy_tiles`] runs a whole pipeline: a [`TileProducer`] reading the source, a
//! [`TileCollector`] assembling the tiles and a [`TileConsumer`] writing them to the sink.

use crate::{
	CopyStats, EventBus, ReadRequest, StreamItem, TileCollector, TileConsumer, TileProducer, TileResponse, TileSink,
	TileSource,
};
use anyhow::Result;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::{collections::HashMap, fmt, sync::Arc};
use tilestream_core::{TileCoord, TileSetInfo};

/// Read side helpers for shared sources.
pub trait TileSourceStreamExt {
	/// Streams the tiles of `request`.
	fn create_read_stream(&self, request: ReadRequest) -> TileProducer;
}

impl TileSourceStreamExt for Arc<dyn TileSource> {
	fn create_read_stream(&self, request: ReadRequest) -> TileProducer {
		TileProducer::new(self.clone(), request)
	}
}

/// Write side helpers for boxed sinks.
pub trait TileSinkStreamExt {
	/// Wraps the sink into a stream consumer. `info` describes the tile set being written.
	fn create_write_stream(self, info: TileSetInfo) -> TileWriteStream;
}

impl TileSinkStreamExt for Box<dyn TileSink> {
	fn create_write_stream(self, info: TileSetInfo) -> TileWriteStream {
		TileWriteStream::new(self, info)
	}
}

/// The collecting and writing half of a pipeline.
///
/// `Info` events emitted on [`TileWriteStream::events`] are passed on to the consumer.
pub struct TileWriteStream {
	consumer: TileConsumer,
	events: EventBus,
}

impl TileWriteStream {
	pub fn new(sink: Box<dyn TileSink>, info: TileSetInfo) -> TileWriteStream {
		let mut consumer = TileConsumer::new(sink, info);
		let events = EventBus::new();
		consumer.watch(&events);
		TileWriteStream { consumer, events }
	}

	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// Collects and writes every tile of `items`, then finishes the sink.
	pub async fn consume<S>(self, items: S) -> Result<CopyStats>
	where
		S: Stream<Item = StreamItem> + Unpin,
	{
		let TileWriteStream { mut consumer, events } = self;
		let mut collector = TileCollector::with_upstream_events(items, &events);
		consumer.watch(collector.events());

		while let Some(record) = collector.next().await {
			consumer.write(record).await?;
		}
		let stats = consumer.finish().await?;
		log::debug!(
			"wrote {} tiles ({} bytes), metadata written: {}",
			stats.tiles_written,
			stats.bytes_written,
			stats.info_written
		);
		Ok(stats)
	}

	/// Like [`TileWriteStream::consume`], also passing on the producer's metadata.
	pub async fn consume_producer(self, producer: TileProducer) -> Result<CopyStats> {
		let upstream = producer.events().clone();
		let id = upstream.forward_info(&self.events);
		let result = self.consume(producer).await;
		upstream.unsubscribe(id);
		result
	}
}

impl fmt::Debug for TileWriteStream {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TileWriteStream")
			.field("consumer", &self.consumer)
			.finish()
	}
}

/// Copies the tiles of `request` from `source` to `sink`.
///
/// `sink_info` is the caller's description of the destination; it is reconciled with the source
/// metadata before being written to sinks that store metadata.
pub async fn copy_tiles(
	source: Arc<dyn TileSource>,
	sink: Box<dyn TileSink>,
	request: ReadRequest,
	sink_info: TileSetInfo,
) -> Result<CopyStats> {
	let producer = source.create_read_stream(request);
	sink.create_write_stream(sink_info).consume_producer(producer).await
}

type SourceEnhancer = Arc<dyn Fn(Arc<dyn TileSource>) -> Arc<dyn TileSource> + Send + Sync>;

/// A decorated source, marked so it is never decorated again.
struct StreamableSource(Arc<dyn TileSource>);

#[async_trait]
impl TileSource for StreamableSource {
	async fn get_tile(&self, coord: &TileCoord) -> Result<TileResponse> {
		self.0.get_tile(coord).await
	}

	async fn get_info(&self) -> Result<Option<TileSetInfo>> {
		self.0.get_info().await
	}

	fn is_streamable(&self) -> bool {
		true
	}
}

/// Maps URI protocols to source decorators.
///
/// A caller registers a decorator per protocol and passes every source it opens through
/// [`StreamingRegistry::enhance`]. Sources of unregistered protocols are returned unchanged, and
/// so are sources that were enhanced before.
#[derive(Clone, Default)]
pub struct StreamingRegistry {
	enhancers: HashMap<String, SourceEnhancer>,
}

impl StreamingRegistry {
	#[must_use]
	pub fn new() -> StreamingRegistry {
		StreamingRegistry::default()
	}

	/// Registers `enhancer` for `protocol`, given with or without the trailing `:`.
	pub fn register<F>(&mut self, protocol: &str, enhancer: F)
	where
		F: Fn(Arc<dyn TileSource>) -> Arc<dyn TileSource> + Send + Sync + 'static,
	{
		let protocol = protocol.trim_end_matches(':').to_ascii_lowercase();
		self.enhancers.insert(protocol, Arc::new(enhancer));
	}

	pub fn is_registered(&self, protocol: &str) -> bool {
		self.enhancers.contains_key(&protocol.trim_end_matches(':').to_ascii_lowercase())
	}

	/// Applies the decorator registered for the protocol of `uri`, if any.
	pub fn enhance(&self, uri: &str, source: Arc<dyn TileSource>) -> Arc<dyn TileSource> {
		if source.is_streamable() {
			return source;
		}
		let Some((protocol, _)) = uri.split_once(':') else {
			return source;
		};
		match self.enhancers.get(&protocol.to_ascii_lowercase()) {
			Some(enhancer) => {
				log::debug!("enhancing source '{uri}'");
				Arc::new(StreamableSource(enhancer(source)))
			}
			None => source,
		}
	}
}

impl fmt::Debug for StreamingRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut protocols: Vec<&String> = self.enhancers.keys().collect();
		protocols.sort();
		f.debug_struct("StreamingRegistry")
			.field("protocols", &protocols)
			.finish()
	}
}
