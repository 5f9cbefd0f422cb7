//! The transform stage: reads each [`TileCarrier`] to its end and emits one [`TileRecord`].
//!
//! Carriers are drained one at a time, in the order they arrive. Before a carrier is read, a
//! [`HeaderAccumulator`] is connected to it, so headers the producer attaches to the tile end up
//! in the record. Heartbeats are swallowed.

use crate::{EventBus, HeaderAccumulator, ListenerId, StreamItem, TileCarrier, TileProducer, TileRecord};
use futures::{Stream, StreamExt};
use std::{
	pin::Pin,
	sync::Arc,
	task::{Context, Poll, ready},
};
use tilestream_core::Blob;

struct ActiveTile {
	carrier: TileCarrier,
	headers: Arc<HeaderAccumulator>,
	chunks: Vec<Blob>,
}

impl ActiveTile {
	fn new(carrier: TileCarrier) -> ActiveTile {
		let headers = Arc::new(HeaderAccumulator::new());
		carrier.connect(headers.clone());
		ActiveTile {
			carrier,
			headers,
			chunks: Vec::new(),
		}
	}

	fn into_record(self) -> TileRecord {
		TileRecord::new(self.carrier.coord(), Blob::concat(self.chunks), self.headers.take())
	}
}

/// Stream of [`TileRecord`]s built from a stream of [`StreamItem`]s.
pub struct TileCollector<S> {
	upstream: S,
	events: EventBus,
	forwarding: Option<(EventBus, ListenerId)>,
	active: Option<ActiveTile>,
	done: bool,
}

impl<S> TileCollector<S>
where
	S: Stream<Item = StreamItem> + Unpin,
{
	pub fn new(upstream: S) -> TileCollector<S> {
		TileCollector {
			upstream,
			events: EventBus::new(),
			forwarding: None,
			active: None,
			done: false,
		}
	}

	/// Creates a collector that re-emits every `Info` event published on `upstream_events`.
	pub fn with_upstream_events(upstream: S, upstream_events: &EventBus) -> TileCollector<S> {
		let mut collector = TileCollector::new(upstream);
		let id = upstream_events.forward_info(&collector.events);
		collector.forwarding = Some((upstream_events.clone(), id));
		collector
	}

	/// Bus carrying the forwarded `Info` and one `Tile` event per record.
	pub fn events(&self) -> &EventBus {
		&self.events
	}
}

impl TileCollector<TileProducer> {
	/// Collects the tiles of `producer`, forwarding its metadata.
	pub fn from_producer(producer: TileProducer) -> TileCollector<TileProducer> {
		let upstream_events = producer.events().clone();
		TileCollector::with_upstream_events(producer, &upstream_events)
	}
}

impl<S> Stream for TileCollector<S>
where
	S: Stream<Item = StreamItem> + Unpin,
{
	type Item = TileRecord;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<TileRecord>> {
		let this = &mut *self;
		loop {
			if let Some(active) = &mut this.active {
				match ready!(active.carrier.poll_next_unpin(cx)) {
					Some(chunk) => active.chunks.push(chunk),
					None => {
						if let Some(active) = this.active.take() {
							let record = active.into_record();
							log::trace!("collected tile {} ({} bytes)", record.coord.as_path(), record.length());
							this.events.tile(record.to_event());
							return Poll::Ready(Some(record));
						}
					}
				}
				continue;
			}

			if this.done {
				return Poll::Ready(None);
			}

			match ready!(this.upstream.poll_next_unpin(cx)) {
				Some(StreamItem::Tile(carrier)) => this.active = Some(ActiveTile::new(carrier)),
				Some(StreamItem::Heartbeat) => log::trace!("heartbeat"),
				None => {
					this.done = true;
					return Poll::Ready(None);
				}
			}
		}
	}
}

impl<S> Drop for TileCollector<S> {
	fn drop(&mut self) {
		if let Some((bus, id)) = self.forwarding.take() {
			bus.unsubscribe(id);
		}
	}
}
