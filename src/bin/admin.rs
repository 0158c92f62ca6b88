//! CLI administration tool for rest-boot services.
//!
//! Manages settings, drops page cache groups and inspects stored records
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List all settings
//! cargo run --bin admin -- settings list
//!
//! # Read one setting
//! cargo run --bin admin -- settings get site_name --default "My site"
//!
//! # Write a setting (value is parsed as JSON, else stored as a string)
//! cargo run --bin admin -- settings set maintenance true
//!
//! # Drop every cached page of a group
//! cargo run --bin admin -- page-cache forget articles
//!
//! # Record counts per resource
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! The tool reads the server's configuration (see `rest_boot::config`), so
//! both agree on connections and cache behaviour:
//!
//! - `DATABASE_URL` or `DB_*` (required): PostgreSQL connection
//! - `REDIS_URL` or `REDIS_*` (optional): cache to invalidate on settings
//!   writes and to forget page groups in
//! - `CACHE_PREFIX`: key prefix shared with the server
//! - `SETTINGS_CACHE`, `SETTINGS_CACHE_TTL_SECONDS`: settings snapshot caching

use rest_boot::application::services::{CachedSettingStore, PageCache};
use rest_boot::config::{self, Config};
use rest_boot::domain::entities::Attributes;
use rest_boot::domain::repositories::SettingStore;
use rest_boot::infrastructure::cache::{CacheStore, RedisCache};
use rest_boot::infrastructure::persistence::PgSettingStore;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing rest-boot services.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage the page cache
    PageCache {
        #[command(subcommand)]
        action: PageCacheAction,
    },

    /// Show record counts per resource
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Settings subcommands.
#[derive(Subcommand)]
enum SettingsAction {
    /// List all settings
    List,

    /// Print one setting
    Get {
        key: String,

        /// Printed when the key is missing
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Write one setting
    Set {
        key: String,

        /// JSON value; anything that is not valid JSON is stored as a string
        value: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Page cache subcommands.
#[derive(Subcommand)]
enum PageCacheAction {
    /// Delete every page stored under the given groups
    Forget {
        #[arg(required = true)]
        groups: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    match cli.command {
        Commands::Settings { action } => handle_settings_action(action, &config).await,
        Commands::PageCache { action } => handle_page_cache_action(action, &config).await,
        Commands::Stats => handle_stats(&connect_db(&config).await?).await,
        Commands::Db { action } => handle_db_action(action, &connect_db(&config).await?).await,
    }
}

async fn connect_db(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Connects to the server's Redis cache when one is configured.
async fn connect_cache(config: &Config) -> Result<Option<Arc<dyn CacheStore>>> {
    let Some(redis_url) = &config.redis_url else {
        return Ok(None);
    };

    let cache = RedisCache::connect(redis_url, config.cache_prefix.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?;

    Ok(Some(Arc::new(cache)))
}

/// Lifetime of the settings snapshot the server keeps in a shared cache, if
/// it keeps one there.
fn shared_snapshot_ttl(config: &Config) -> Option<Duration> {
    (config.settings_cache && config.is_cache_enabled()).then(|| config.settings_cache_ttl())
}

/// Dispatches settings commands.
///
/// When the server caches settings in Redis, writes go through the caching
/// decorator so the server's snapshot is replaced.
async fn handle_settings_action(action: SettingsAction, config: &Config) -> Result<()> {
    let pool = connect_db(config).await?;
    let persisted = PgSettingStore::new(Arc::new(pool));

    let store: Box<dyn SettingStore> = match shared_snapshot_ttl(config) {
        Some(ttl) => {
            let cache = connect_cache(config)
                .await?
                .context("Redis cache is not configured")?;
            Box::new(CachedSettingStore::new(persisted, cache, ttl))
        }
        None => Box::new(persisted),
    };

    match action {
        SettingsAction::List => list_settings(store.as_ref()).await,
        SettingsAction::Get { key, default } => {
            get_setting(store.as_ref(), &key, default.map(Value::String)).await
        }
        SettingsAction::Set { key, value, yes } => {
            set_setting(store.as_ref(), key, parse_value(&value), yes).await
        }
    }
}

/// Reads a CLI argument as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Lists all settings.
///
/// # Output Format
///
/// ```text
/// Settings
///
///   Key                            Value
///   ───────────────────────────────────────────────
///   maintenance                    false
///   site_name                      "My site"
/// ```
async fn list_settings(store: &dyn SettingStore) -> Result<()> {
    println!("{}", "Settings".bright_blue().bold());
    println!();

    let all = store
        .all_to_array()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;

    if all.is_empty() {
        println!("{}", "  No settings stored".yellow());
        return Ok(());
    }

    println!(
        "  {:<30} {}",
        "Key".bright_white().bold(),
        "Value".bright_white().bold()
    );
    println!("  {}", "─".repeat(60).bright_black());

    for (key, value) in &all {
        println!("  {:<30} {}", key.cyan(), value.to_string());
    }

    println!();
    println!("  Total: {}", all.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn get_setting(store: &dyn SettingStore, key: &str, default: Option<Value>) -> Result<()> {
    let value = store
        .get_setting(key, default)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read setting: {}", e))?;

    println!("{} = {}", key.cyan(), value.to_string().bright_yellow());
    Ok(())
}

/// Writes one setting after confirmation.
async fn set_setting(store: &dyn SettingStore, key: String, value: Value, yes: bool) -> Result<()> {
    println!("{}", "Update setting".bright_blue().bold());
    println!();
    println!("  Key:   {}", key.cyan());
    println!("  Value: {}", value.to_string().bright_yellow());
    println!();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Save this setting?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let mut settings = Attributes::new();
    settings.insert(key, value);

    store
        .set_setting(settings)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save setting: {}", e))?;

    println!("{}", "Setting saved".green().bold());
    Ok(())
}

/// Forgets page cache groups after confirmation.
async fn handle_page_cache_action(action: PageCacheAction, config: &Config) -> Result<()> {
    let PageCacheAction::Forget { groups, yes } = action;

    let cache = connect_cache(config)
        .await?
        .context("REDIS_URL or REDIS_HOST must be set to manage the page cache")?;

    println!("{}", "Forget page cache groups".bright_blue().bold());
    for group in &groups {
        println!("  {}", group.cyan());
    }
    println!();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every cached page of these groups?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    PageCache::new(cache)
        .forget(&groups)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to forget groups: {}", e))?;

    println!("{}", "Page cache groups forgotten".green().bold());
    Ok(())
}

/// Displays active and trashed record counts for every resource.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Records".bright_blue().bold());
    println!();

    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT resource,
               COUNT(*) FILTER (WHERE deleted_at IS NULL),
               COUNT(*) FILTER (WHERE deleted_at IS NOT NULL)
        FROM records
        GROUP BY resource
        ORDER BY resource
        "#,
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        println!("{}", "  No records stored".yellow());
        return Ok(());
    }

    println!(
        "  {:<20} {:>10} {:>10}",
        "Resource".bright_white().bold(),
        "Active".bright_white().bold(),
        "Trashed".bright_white().bold()
    );
    println!("  {}", "─".repeat(42).bright_black());

    for (resource, active, trashed) in rows {
        println!(
            "  {:<20} {:>10} {:>10}",
            resource.cyan(),
            active.to_string().bright_green(),
            trashed.to_string().bright_black()
        );
    }
    println!();

    Ok(())
}

/// Dispatches database commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").execute(pool).await?;
            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let size: String =
                sqlx::query_scalar("SELECT pg_size_pretty(pg_database_size(current_database()))")
                    .fetch_one(pool)
                    .await?;

            println!("{}", "Database".bright_blue().bold());
            println!("  Version: {}", version.bright_black());
            println!("  Size:    {}", size.bright_white());
        }
    }

    Ok(())
}
