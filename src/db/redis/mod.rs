pub mod cache;
pub mod macros;
