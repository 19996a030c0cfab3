pub mod cache;
pub mod loader;
pub mod source;

pub use cache::TileCache;
pub use loader::{TileLoader, TileResponse};
pub use source::{visible_tiles, TileSource};
