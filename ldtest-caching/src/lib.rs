//! Result caching for ldtest
//!
//! Load test results are memoized per target for a limited time. An entry only
//! answers lookups made with the same configuration fingerprint it was stored under.

pub mod errors;
pub mod result_cache;

pub use errors::{CacheError, CacheResult};
pub use result_cache::{CacheEntry, ResultCache};
