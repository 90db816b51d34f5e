pub mod auth;
pub mod config_service;
pub mod defaults;
pub mod draft;
pub mod merge;
pub mod sessions;
pub mod tenancy_service;

pub use auth::AuthService;
pub use config_service::ConfigService;
pub use sessions::DraftSessions;
pub use tenancy_service::TenantService;
