//! Cache statistics and health overview.
//!
//! Summarizes what the durable tier holds: entry counts per namespace and
//! version, and when each was last written. Entries under a version other
//! than the configured one are stale (unreachable) and marked as such.
//! Used by `carecache stats`.

use anyhow::Result;

use care_cache_core::models::RecordKind;
use care_cache_core::store::Namespace;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::{NamespaceCount, SqliteStore};

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;
    let store = SqliteStore::new(pool);
    let counts = store.namespace_counts().await?;

    let total: i64 = counts.iter().map(|c| c.entries).sum();
    let live: i64 = counts
        .iter()
        .filter(|c| is_current(config, c))
        .map(|c| c.entries)
        .sum();

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Care Cache: Database Stats");
    println!("===========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Entries:     {}", total);
    println!("  Current:     {}", live);
    println!("  Stale:       {}", total - live);

    if !counts.is_empty() {
        println!();
        println!("  By namespace:");
        println!(
            "  {:<22} {:<10} {:>8}   {}",
            "NAMESPACE", "VERSION", "ENTRIES", "LAST WRITE"
        );
        println!("  {}", "-".repeat(66));

        for c in &counts {
            let last = c
                .last_write
                .map(format_ts_iso)
                .unwrap_or_else(|| "never".to_string());
            let marker = if is_current(config, c) { "" } else { "  (stale)" };
            println!(
                "  {:<22} {:<10} {:>8}   {}{}",
                c.namespace, c.version, c.entries, last, marker
            );
        }
    }

    println!();

    store.pool().close().await;
    Ok(())
}

/// Whether a counted `(namespace, version)` is the configured version.
fn is_current(config: &Config, count: &NamespaceCount) -> bool {
    namespace_by_name(&count.namespace)
        .map(|ns| *config.cache.versions.for_namespace(ns) == *count.version)
        .unwrap_or(false)
}

fn namespace_by_name(name: &str) -> Option<Namespace> {
    if name == Namespace::Label.name() {
        return Some(Namespace::Label);
    }
    RecordKind::ALL.iter().find_map(|kind| {
        [Namespace::Record(*kind), Namespace::Translation(*kind)]
            .into_iter()
            .find(|ns| ns.name() == name)
    })
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
