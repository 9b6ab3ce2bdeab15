pub mod formats;
pub mod group;
