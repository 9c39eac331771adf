// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::model::WeatherProvider;
use crate::query::PaginationConfig;
use crate::repository::StorageConfig;

pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";

/// Provider API keys. A missing key disables that provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderKeys {
    pub openweathermap: Option<String>,
    pub accuweather: Option<String>,
    pub newsapi: Option<String>,
}

impl ProviderKeys {
    pub fn weather_key(&self, provider: WeatherProvider) -> Option<&str> {
        let key = match provider {
            WeatherProvider::OpenWeatherMap => self.openweathermap.as_deref(),
            WeatherProvider::AccuWeather => self.accuweather.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    pub fn news_key(&self) -> Option<&str> {
        self.newsapi.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub category: String,
    /// ISO alpha-2, lowercase as NewsAPI expects.
    pub country: Option<String>,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            category: "general".to_string(),
            country: Some("us".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `production` hides error details from API responses.
    pub environment: String,
    pub api_keys: ProviderKeys,
    pub weather_provider: WeatherProvider,
    pub cities: Vec<String>,
    pub news: NewsSettings,
    pub storage: StorageConfig,
    /// Scheduled fetch period; 0 disables the scheduler.
    pub fetch_interval_secs: u64,
    /// Per upstream call.
    pub request_timeout_secs: u64,
    pub pagination: PaginationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            api_keys: ProviderKeys::default(),
            weather_provider: WeatherProvider::OpenWeatherMap,
            cities: vec![
                "Hanoi".to_string(),
                "Ho Chi Minh".to_string(),
                "Da Nang".to_string(),
            ],
            news: NewsSettings::default(),
            storage: StorageConfig::default(),
            fetch_interval_secs: 1800,
            request_timeout_secs: 10,
            pagination: PaginationConfig::default(),
        }
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_num<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("{name} must be a number, got '{raw}': {e}"))
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.trim().to_ascii_lowercase().as_str(),
            "production" | "prod"
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn fetch_interval(&self) -> Option<Duration> {
        (self.fetch_interval_secs > 0).then(|| Duration::from_secs(self.fetch_interval_secs))
    }

    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load configuration using file + env:
    /// 1) $AGGREGATOR_CONFIG_PATH (must exist when set)
    /// 2) config/aggregator.toml
    /// 3) built-in defaults
    ///
    /// Environment variables are applied on top of whichever file was used.
    pub fn load() -> Result<Self> {
        let mut cfg = match config_path()? {
            Some(p) => Self::load_from(&p)?,
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Override settings from environment-style variables. Blank values are ignored.
    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("APP_ENV") {
            self.environment = v.trim().to_string();
        }
        if let Some(v) = var("OPENWEATHERMAP_API_KEY") {
            self.api_keys.openweathermap = Some(v);
        }
        if let Some(v) = var("ACCUWEATHER_API_KEY") {
            self.api_keys.accuweather = Some(v);
        }
        if let Some(v) = var("NEWSAPI_API_KEY") {
            self.api_keys.newsapi = Some(v);
        }
        if let Some(v) = var("WEATHER_PROVIDER") {
            self.weather_provider = v.parse().map_err(|e| anyhow!("WEATHER_PROVIDER: {e}"))?;
        }
        if let Some(v) = var("DEFAULT_CITIES") {
            self.cities = split_csv(&v);
        }
        if let Some(v) = var("NEWS_CATEGORY") {
            self.news.category = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = var("NEWS_COUNTRY") {
            self.news.country = Some(v.trim().to_ascii_lowercase());
        }
        if let Some(v) = var("DATABASE_TYPE") {
            self.storage.backend = v.trim().to_string();
        }
        if let Some(v) = var("DATABASE_URL") {
            self.storage.url = v.trim().to_string();
        }
        if let Some(v) = var("DATABASE_AUTH_TOKEN") {
            self.storage.auth_token = Some(v);
        }
        if let Some(v) = var("FETCH_INTERVAL_SECS") {
            self.fetch_interval_secs = parse_num("FETCH_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_num("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = parse_num("PAGINATION_DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = var("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = parse_num("PAGINATION_MAX_LIMIT", &v)?;
        }

        self.storage.kind().map_err(|e| anyhow!("DATABASE_TYPE: {e}"))?;
        if self.pagination.default_limit > self.pagination.max_limit {
            self.pagination.default_limit = self.pagination.max_limit;
        }
        Ok(())
    }
}

fn config_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}
