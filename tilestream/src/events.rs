//! Event bus for pipeline events
//!
//! Stages publish two kinds of events:
//! - [`PipelineEvent::Info`]: the tile set description of the source, emitted once early and
//!   forwarded from stage to stage,
//! - [`PipelineEvent::Tile`]: one per completed tile; purely informational.

use arc_swap::ArcSwap;
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
use tilestream_core::{TileCoord, TileHeaders, TileSetInfo};

/// Event types that can be emitted by a pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
	/// Tile set description discovered from the source
	Info(TileSetInfo),

	/// A tile has been fully received
	Tile(TileEvent),
}

/// Observability record of one received tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEvent {
	pub coord: TileCoord,
	pub headers: TileHeaders,
	pub length: u64,
}

/// Unique identifier for event listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type EventListener = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Thread-safe event bus
///
/// Listeners are called synchronously, in registration order, on the thread emitting the event.
/// Uses arc-swap so emitting never takes a lock.
#[derive(Clone)]
pub struct EventBus {
	listeners: Arc<ArcSwap<Vec<(ListenerId, EventListener)>>>,
	next_id: Arc<AtomicUsize>,
}

impl EventBus {
	/// Create a new event bus
	pub fn new() -> Self {
		Self {
			listeners: Arc::new(ArcSwap::from_pointee(Vec::new())),
			next_id: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Register an event listener
	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&PipelineEvent) + Send + Sync + 'static,
	{
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let listener: EventListener = Arc::new(listener);
		self.listeners.rcu(|old| {
			let mut new = (**old).clone();
			new.push((id, listener.clone()));
			new
		});
		id
	}

	/// Remove a listener. Unknown ids are ignored.
	pub fn unsubscribe(&self, id: ListenerId) {
		self.listeners.rcu(|old| {
			old
				.iter()
				.filter(|(other, _)| *other != id)
				.cloned()
				.collect::<Vec<_>>()
		});
	}

	/// Emit an event to all listeners
	///
	/// If a listener panics, the panic is caught and the other listeners still run.
	pub fn emit(&self, event: PipelineEvent) {
		let listeners = self.listeners.load();
		for (_, listener) in listeners.iter() {
			let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
				listener(&event);
			}));
		}
	}

	pub fn info(&self, info: TileSetInfo) {
		self.emit(PipelineEvent::Info(info));
	}

	pub fn tile(&self, event: TileEvent) {
		self.emit(PipelineEvent::Tile(event));
	}

	/// Re-emit every `Info` event of `self` on `target`.
	pub fn forward_info(&self, target: &EventBus) -> ListenerId {
		let target = target.clone();
		self.subscribe(move |event| {
			if let PipelineEvent::Info(info) = event {
				target.info(info.clone());
			}
		})
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.load().len()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("listeners", &self.listener_count())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;

	fn tile_event() -> TileEvent {
		TileEvent {
			coord: TileCoord::new(0, 0, 0).unwrap(),
			headers: TileHeaders::new(),
			length: 3,
		}
	}

	#[test]
	fn subscribers_see_events_in_order() {
		let bus = EventBus::new();
		let seen = Arc::new(Mutex::new(Vec::new()));

		let s1 = seen.clone();
		bus.subscribe(move |_| s1.lock().push(1));
		let s2 = seen.clone();
		bus.subscribe(move |_| s2.lock().push(2));

		bus.tile(tile_event());
		assert_eq!(*seen.lock(), [1, 2]);
	}

	#[test]
	fn unsubscribe_removes_only_that_listener() {
		let bus = EventBus::new();
		let counter = Arc::new(AtomicUsize::new(0));

		let c1 = counter.clone();
		let id = bus.subscribe(move |_| {
			c1.fetch_add(1, Ordering::SeqCst);
		});
		let c2 = counter.clone();
		bus.subscribe(move |_| {
			c2.fetch_add(10, Ordering::SeqCst);
		});

		bus.unsubscribe(id);
		assert_eq!(bus.listener_count(), 1);
		bus.info(TileSetInfo::new());
		assert_eq!(counter.load(Ordering::SeqCst), 10);
	}

	#[test]
	fn panicking_listener_does_not_stop_others() {
		let bus = EventBus::new();
		let counter = Arc::new(AtomicUsize::new(0));
		bus.subscribe(|_| panic!("boom"));
		let c = counter.clone();
		bus.subscribe(move |_| {
			c.fetch_add(1, Ordering::SeqCst);
		});
		bus.tile(tile_event());
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn forward_info_ignores_tile_events() {
		let upstream = EventBus::new();
		let downstream = EventBus::new();
		upstream.forward_info(&downstream);

		let seen = Arc::new(Mutex::new(Vec::new()));
		let s = seen.clone();
		downstream.subscribe(move |event| s.lock().push(event.clone()));

		upstream.tile(tile_event());
		upstream.info(TileSetInfo::new().with_zoom(1, 2));
		assert_eq!(
			*seen.lock(),
			[PipelineEvent::Info(TileSetInfo::new().with_zoom(1, 2))]
		);
	}
}
