//! Downstream targets of a [`TileCarrier`](super::TileCarrier) and the header fan-out to them.

use parking_lot::Mutex;
use std::sync::Arc;
use tilestream_core::TileHeaders;

/// A target that accepts header key/value pairs.
pub trait HeaderTarget: Send + Sync {
	fn set_header(&self, key: &str, value: &str);
}

/// Anything a carrier can be connected to.
///
/// Targets that want headers return themselves from [`CarrierTarget::as_header_target`]; all
/// others are skipped when headers are forwarded.
pub trait CarrierTarget: Send + Sync {
	fn as_header_target(&self) -> Option<&dyn HeaderTarget> {
		None
	}
}

/// Handle of one connection, returned by [`TileCarrier::connect`](super::TileCarrier::connect).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

/// The currently connected targets, in connection order.
#[derive(Default)]
pub(crate) struct HeaderTargets {
	next_id: u64,
	targets: Vec<(TargetId, Arc<dyn CarrierTarget>)>,
}

impl HeaderTargets {
	pub fn register(&mut self, target: Arc<dyn CarrierTarget>) -> TargetId {
		let id = TargetId(self.next_id);
		self.next_id += 1;
		self.targets.push((id, target));
		id
	}

	/// Removes one target; returns `false` if it was not connected.
	pub fn unregister(&mut self, id: TargetId) -> bool {
		let before = self.targets.len();
		self.targets.retain(|(other, _)| *other != id);
		self.targets.len() != before
	}

	pub fn clear(&mut self) {
		self.targets.clear();
	}

	/// Sets every header on every connected target that accepts headers.
	///
	/// Returns the number of targets reached.
	pub fn set_headers(&self, headers: &TileHeaders) -> usize {
		let mut reached = 0;
		for target in self.targets.iter().filter_map(|(_, t)| t.as_header_target()) {
			for (key, value) in headers {
				target.set_header(key, value);
			}
			reached += 1;
		}
		reached
	}

	pub fn len(&self) -> usize {
		self.targets.len()
	}
}

/// A target collecting the headers it is given, later keys overwriting earlier ones.
#[derive(Default)]
pub struct HeaderAccumulator {
	headers: Mutex<TileHeaders>,
}

impl HeaderAccumulator {
	#[must_use]
	pub fn new() -> HeaderAccumulator {
		HeaderAccumulator::default()
	}

	/// Returns a copy of everything received so far.
	#[must_use]
	pub fn headers(&self) -> TileHeaders {
		self.headers.lock().clone()
	}

	/// Takes everything received so far, leaving the accumulator empty.
	pub fn take(&self) -> TileHeaders {
		std::mem::take(&mut *self.headers.lock())
	}
}

impl HeaderTarget for HeaderAccumulator {
	fn set_header(&self, key: &str, value: &str) {
		self.headers.lock().insert(key, value);
	}
}

impl CarrierTarget for HeaderAccumulator {
	fn as_header_target(&self) -> Option<&dyn HeaderTarget> {
		Some(self)
	}
}
