pub mod base;
pub mod marker;
pub mod tile;
