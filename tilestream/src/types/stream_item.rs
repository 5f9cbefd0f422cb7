use crate::TileCarrier;
use std::fmt;

/// An item of the producer's output stream.
pub enum StreamItem {
	/// One fetched tile; its bytes and headers are read from the carrier.
	Tile(TileCarrier),
	/// Keep-alive item emitted while fetches are slow. Carries no tile.
	Heartbeat,
}

impl StreamItem {
	#[must_use]
	pub fn is_heartbeat(&self) -> bool {
		matches!(self, StreamItem::Heartbeat)
	}

	/// Returns the carrier, or `None` for a heartbeat.
	#[must_use]
	pub fn into_carrier(self) -> Option<TileCarrier> {
		match self {
			StreamItem::Tile(carrier) => Some(carrier),
			StreamItem::Heartbeat => None,
		}
	}
}

impl fmt::Debug for StreamItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StreamItem::Tile(carrier) => write!(f, "Tile({:?})", carrier.coord()),
			StreamItem::Heartbeat => write!(f, "Heartbeat"),
		}
	}
}
