pub mod auth;
pub mod config;
pub mod permissions;
pub mod roles;
pub mod settings;
pub mod tenancy;
pub mod workflow;
