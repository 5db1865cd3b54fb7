pub mod limit_pool;
pub mod pooled;
