pub mod typed;

pub use typed::{CacheError, CacheResult, TypedCache};
