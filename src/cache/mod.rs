//! Local cache of lookup results, one JSON file per cache.
//!
//! Entries survive between runs so re-running a DOI list costs no network
//! calls for DOIs already resolved.

mod entry;
mod store;

pub use entry::CacheEntry;
pub use store::{CACHE_FORMAT_VERSION, Cache, CacheError, CacheWarning};
