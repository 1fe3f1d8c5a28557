use std::env;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use frontrow::{
    config::{Backend, Config},
    postgres::PgStore,
    store::{Store, StoreError},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let Backend::Postgres { database_url } = &config.backend else {
        bail!("load_concerts only works against postgres (unset FRONTROW_STORE)");
    };

    let store = PgStore::connect(database_url, config.max_connections, config.store_timeout).await?;
    store.apply_schema().await?;
    println!("Connected to database!");

    let path = env::args().nth(1).unwrap_or_else(|| "concerts.txt".to_string());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {path} - make sure it exists!"))?;

    let mut count = 0;
    let mut skipped = 0;

    for (number, line) in content.lines().enumerate() {
        let Some((band_name, concert_date)) =
            parse_line(line).with_context(|| format!("{path}:{}", number + 1))?
        else {
            continue;
        };

        match store.create_concert(band_name, concert_date).await {
            Ok(_) => {
                count += 1;
                println!("✓ Loaded: {}", band_name);
            }
            Err(StoreError::AlreadyExists(_)) => {
                println!("⊘ Skipped (duplicate): {}", band_name);
                skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Successfully loaded {} new concerts!", count);
    if skipped > 0 {
        println!("⊘ Skipped {} duplicate concerts", skipped);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(())
}

/// `band name` or `band name | YYYY-MM-DD`. Blank lines and `#` comments yield `None`.
fn parse_line(line: &str) -> anyhow::Result<Option<(&str, Option<NaiveDate>)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (band_name, date) = match line.split_once('|') {
        Some((name, date)) => (name.trim(), Some(date.trim())),
        None => (line, None),
    };
    if band_name.is_empty() {
        bail!("missing band name");
    }

    let concert_date = date
        .filter(|d| !d.is_empty())
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").with_context(|| format!("bad date {d:?}")))
        .transpose()?;

    Ok(Some((band_name, concert_date)))
}
