// src/repository/migrations.rs
//! Table definitions shared by both backends. Timestamps are unix seconds.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS weather (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider TEXT NOT NULL,
        city TEXT NOT NULL,
        country TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        temperature REAL NOT NULL,
        feels_like REAL NOT NULL,
        temp_min REAL NOT NULL,
        temp_max REAL NOT NULL,
        humidity INTEGER NOT NULL,
        pressure INTEGER NOT NULL,
        wind_speed REAL NOT NULL,
        wind_direction INTEGER NOT NULL,
        condition_main TEXT NOT NULL,
        condition_description TEXT NOT NULL,
        condition_icon TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_weather_city_timestamp ON weather (city, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_weather_timestamp ON weather (timestamp)",
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        content TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        image_url TEXT,
        published_at INTEGER,
        source_name TEXT NOT NULL,
        author TEXT,
        provider TEXT NOT NULL DEFAULT 'newsapi',
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_news_published_at ON news (published_at)",
];
