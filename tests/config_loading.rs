// tests/config_loading.rs
use std::{env, fs};

use weather_news_aggregator::config::{AppConfig, ENV_CONFIG_PATH};
use weather_news_aggregator::model::WeatherProvider;

const SAMPLE: &str = r#"
environment = "production"
weather_provider = "accuweather"
cities = ["Hue", "Can Tho"]
fetch_interval_secs = 0

[news]
category = "technology"

[storage]
type = "libsql"
url = "file:data/test.db"

[pagination]
default_limit = 25
"#;

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        "APP_ENV",
        "WEATHER_PROVIDER",
        "OPENWEATHERMAP_API_KEY",
        "ACCUWEATHER_API_KEY",
        "NEWSAPI_API_KEY",
        "DEFAULT_CITIES",
        "NEWS_CATEGORY",
        "NEWS_COUNTRY",
        "DATABASE_TYPE",
        "DATABASE_URL",
        "DATABASE_AUTH_TOKEN",
        "FETCH_INTERVAL_SECS",
        "REQUEST_TIMEOUT_SECS",
        "PAGINATION_DEFAULT_LIMIT",
        "PAGINATION_MAX_LIMIT",
    ] {
        env::remove_var(k);
    }
}

#[test]
fn toml_file_fills_only_what_it_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aggregator.toml");
    fs::write(&path, SAMPLE).unwrap();

    let cfg = AppConfig::load_from(&path).unwrap();
    assert!(cfg.is_production());
    assert_eq!(cfg.weather_provider, WeatherProvider::AccuWeather);
    assert_eq!(cfg.cities, vec!["Hue".to_string(), "Can Tho".to_string()]);
    assert_eq!(cfg.fetch_interval(), None);
    assert_eq!(cfg.news.category, "technology");
    assert_eq!(cfg.news.country.as_deref(), Some("us"));
    assert_eq!(cfg.storage.backend, "libsql");
    assert_eq!(cfg.pagination.default_limit, 25);
    assert_eq!(cfg.pagination.max_limit, 100);
    assert_eq!(cfg.request_timeout_secs, 10);
}

#[test]
fn broken_toml_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "cities = [\"Hue\"").unwrap();
    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}

#[serial_test::serial]
#[test]
fn load_uses_env_path_then_fallback_then_defaults() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing → built-in defaults
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg, AppConfig::default());

    // 2) fallback file in ./config/
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/aggregator.toml"), r#"cities = ["Hue"]"#).unwrap();
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.cities, vec!["Hue".to_string()]);

    // 3) env path wins over the fallback, env vars win over the file
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, SAMPLE).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    env::set_var("DEFAULT_CITIES", "Hanoi,Hai Phong");
    env::set_var("DATABASE_TYPE", "sqlx");
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.weather_provider, WeatherProvider::AccuWeather);
    assert_eq!(cfg.cities, vec!["Hanoi".to_string(), "Hai Phong".to_string()]);
    assert_eq!(cfg.storage.backend, "sqlx");

    // 4) a dangling env path is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AppConfig::load().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
