pub mod postgres;
pub mod redis;

pub use postgres::create_pool;
pub use redis::cache::create_redis_client;
pub use redis::cache::Cache;
pub use redis::cache::CacheKey;
pub use redis::cache::CacheWriterHandle;
