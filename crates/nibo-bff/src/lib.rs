pub mod cache;
pub mod config;
pub mod gateway;
pub mod handlers;
pub mod observability;
pub mod server;

pub use cache::{CacheEntry, CachedPayload, ResponseCache, SingleSlotCache};
pub use config::{AppConfig, ConfigError, LoggingConfig, NiboConfig, ServerConfig};
pub use gateway::{AccountsProxy, AccountsReply, ProxyError, QueryParams, ReplySource};
pub use observability::init_tracing;
pub use server::{AppState, NiboBffServer, ServerBuilder, build_app};
