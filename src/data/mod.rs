pub mod collection;
pub mod feature;
pub mod source;
