mod buffer_pool_manager;
mod eviction;
mod lru_k_replacer;

pub use buffer_pool_manager::*;
pub use eviction::*;
pub use lru_k_replacer::*;
