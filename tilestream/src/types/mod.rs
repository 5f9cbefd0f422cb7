//! The contracts of the collaborators around the pipeline, and the items flowing through it.

mod stream_item;
mod tile_record;
mod tile_sink;
mod tile_source;

pub use stream_item::*;
pub use tile_record::*;
pub use tile_sink::*;
pub use tile_source::*;
