pub mod config_repo;
pub use config_repo::{ConfigStore, PgConfigStore};
pub mod tenancy_repo;
pub use tenancy_repo::{PgTenantRepository, TenantRepository};
pub mod memory;
pub use memory::MemoryBackend;
