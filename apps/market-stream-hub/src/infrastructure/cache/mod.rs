//! Cache Backends
//!
//! Concrete [`CachePort`](crate::application::ports::CachePort)
//! implementations. Services never use these directly; they are always
//! wrapped in [`FailOpenCache`](crate::application::services::FailOpenCache).

pub mod glob;
mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
