//! The per-tile byte stream travelling from the producer to the collector.
//!
//! A carrier is created as a pair: the [`TileCarrierWriter`] stays with whoever fetched the tile,
//! the [`TileCarrier`] goes downstream and is read as a `Stream<Item = Blob>`. Besides the bytes,
//! a carrier forwards headers to the targets connected to it. Forwarding is best effort: a header
//! set while a target is not connected never reaches that target.
//!
//! ```
//! use futures::StreamExt;
//! use std::sync::Arc;
//! use tilestream::{HeaderAccumulator, TileCarrier};
//! use tilestream_core::{Blob, TileCoord, TileHeaders};
//!
//! # futures::executor::block_on(async {
//! let (writer, mut carrier) = TileCarrier::channel(TileCoord::new(2, 1, 3).unwrap());
//! let headers: TileHeaders = [("Content-Type", "image/png")].into_iter().collect();
//! writer.end_deferred(Some(headers.clone()), Some(Blob::from("png")));
//!
//! let target = Arc::new(HeaderAccumulator::new());
//! carrier.connect(target.clone());
//! assert_eq!(carrier.next().await, Some(Blob::from("png")));
//! assert_eq!(carrier.next().await, None);
//! assert_eq!(target.headers(), headers);
//! # });
//! ```

mod targets;
pub use targets::{CarrierTarget, HeaderAccumulator, HeaderTarget, TargetId};
use targets::HeaderTargets;

use anyhow::{Result, anyhow};
use futures::{
	Stream,
	channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded},
};
use parking_lot::Mutex;
use std::{
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};
use tilestream_core::{Blob, TileCoord, TileHeaders};

/// Final headers and bytes of a tile, applied on the first read of the carrier.
struct DeferredEnd {
	sender: UnboundedSender<Blob>,
	headers: Option<TileHeaders>,
	data: Option<Blob>,
}

#[derive(Default)]
struct Shared {
	targets: HeaderTargets,
	deferred: Option<DeferredEnd>,
}

/// The readable side of one tile.
pub struct TileCarrier {
	coord: TileCoord,
	shared: Arc<Mutex<Shared>>,
	receiver: UnboundedReceiver<Blob>,
}

/// The writable side of one tile.
pub struct TileCarrierWriter {
	coord: TileCoord,
	shared: Arc<Mutex<Shared>>,
	sender: UnboundedSender<Blob>,
}

impl TileCarrier {
	/// Creates a connected writer/carrier pair for `coord`.
	#[must_use]
	pub fn channel(coord: TileCoord) -> (TileCarrierWriter, TileCarrier) {
		let (sender, receiver) = unbounded();
		let shared = Arc::new(Mutex::new(Shared::default()));
		let writer = TileCarrierWriter {
			coord,
			shared: shared.clone(),
			sender,
		};
		let carrier = TileCarrier {
			coord,
			shared,
			receiver,
		};
		(writer, carrier)
	}

	#[must_use]
	pub fn coord(&self) -> TileCoord {
		self.coord
	}

	/// Connects a downstream target. Headers set from now on are forwarded to it.
	pub fn connect(&self, target: Arc<dyn CarrierTarget>) -> TargetId {
		self.shared.lock().targets.register(target)
	}

	/// Disconnects one target, or every target when `id` is `None`.
	pub fn disconnect(&self, id: Option<TargetId>) {
		let mut shared = self.shared.lock();
		match id {
			Some(id) => {
				shared.targets.unregister(id);
			}
			None => shared.targets.clear(),
		}
	}

	#[must_use]
	pub fn connection_count(&self) -> usize {
		self.shared.lock().targets.len()
	}

	/// Forwards `headers` to the currently connected targets that accept headers.
	pub fn set_headers(&self, headers: &TileHeaders) {
		self.shared.lock().targets.set_headers(headers);
	}
}

impl Stream for TileCarrier {
	type Item = Blob;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Blob>> {
		let deferred = self.shared.lock().deferred.take();
		if let Some(end) = deferred {
			if let Some(headers) = &end.headers {
				self.set_headers(headers);
			}
			if let Some(data) = end.data {
				// the receiver is alive while we are polling it
				let _ = end.sender.unbounded_send(data);
			}
		}
		Pin::new(&mut self.receiver).poll_next(cx)
	}
}

impl TileCarrierWriter {
	#[must_use]
	pub fn coord(&self) -> TileCoord {
		self.coord
	}

	/// Appends a chunk. Fails if the carrier was dropped.
	pub fn write(&self, chunk: Blob) -> Result<()> {
		self
			.sender
			.unbounded_send(chunk)
			.map_err(|_| anyhow!("carrier for tile {} is closed", self.coord.as_path()))
	}

	/// Forwards `headers` to the targets connected right now.
	pub fn set_headers(&self, headers: &TileHeaders) {
		self.shared.lock().targets.set_headers(headers);
	}

	/// Writes an optional last chunk and closes the stream.
	pub fn end(self, chunk: Option<Blob>) -> Result<()> {
		if let Some(chunk) = chunk {
			self.write(chunk)?;
		}
		Ok(())
	}

	/// Closes the stream with the complete tile in one unit.
	///
	/// Headers and bytes are applied when the carrier is first read, so every target connected
	/// before that read receives the headers.
	pub fn end_deferred(self, headers: Option<TileHeaders>, data: Option<Blob>) {
		self.shared.lock().deferred = Some(DeferredEnd {
			sender: self.sender,
			headers,
			data,
		});
	}
}
