//! Contains types like coordinates, bounding boxes, tile set descriptions and more.

mod blob;
pub use blob::*;

mod geo_bbox;
pub use geo_bbox::*;

mod tile_coord;
pub use tile_coord::*;

mod tile_headers;
pub use tile_headers::*;

mod tileset_info;
pub use tileset_info::*;
