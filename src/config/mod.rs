// src/config/mod.rs
pub mod app;

pub use app::{AppConfig, NewsSettings, ProviderKeys, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
