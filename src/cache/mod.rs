//! Content hashing and memoisation.
pub mod key;
pub mod store;

pub use key::{grid_key, ContentHasher, ContentKey};
pub use store::{CacheConfig, GammaCache, MuDensityCache, QaCache};
