#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub mod error;
pub mod refresh;
pub mod route;
pub mod status;
pub mod store;
pub mod token;
pub mod transport;
pub mod types;

// Re-exports for convenient access
pub use client::{ApiClient, LogEvents, RegisterParams, SessionEvents};
pub use config::ApiConfig;
pub use error::Error;
pub use refresh::SessionRefresher;
pub use route::{AuthSnapshot, PageAccess, RouteDecision, RoutePaths, decide};
pub use status::{SessionStatus, StatusResolver, UserRole};
pub use store::{CachedStatus, MemoryStorage, SessionStore, StorageBackend};
pub use token::Credential;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{CompanyId, Phone, UserId};
