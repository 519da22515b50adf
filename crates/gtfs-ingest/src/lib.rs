//! Turns feed archives into rows in a `gtfs_store::Store`.
//!
//! `load_and_prepare` is the direct descendant of `load_and_prepare_data`:
//! reset, ingest each feed in order (one feed's failure never stops the
//! next), build indices, hand off to the transfer builder, stamp
//! `updated_at`.

pub mod error;
pub mod feed;
pub mod ingest;
pub mod table;

use chrono::Utc;

pub use error::{IngestError, Result};
pub use feed::{load_feed_config, FeedConfig};
pub use ingest::ArchiveSource;

use gtfs_store::Store;
use transfer_builder::TransferBuilder;

const STALE_AFTER_HOURS: i64 = 24;

/// Runs the full ingestion pipeline: wipe the store, load every feed in
/// order, rebuild the transfer graph, record the completion timestamp.
/// A feed-level failure is logged and the remaining feeds still run; a
/// store failure is fatal and propagates immediately.
pub fn load_and_prepare(
    store: &Store,
    feeds: &[(FeedConfig, ArchiveSource)],
) -> Result<()> {
    store.reset()?;
    store.ensure_schema()?;

    for (index, (config, source)) in feeds.iter().enumerate() {
        match ingest::ingest_feed(store.connection(), &config.name, index, source) {
            Ok(()) => log::info!("ingested feed '{}' (index {:02})", config.name, index),
            Err(err) => log::warn!("feed '{}' failed to ingest: {}", config.name, err),
        }
    }

    store.ensure_schema()?;

    let builder = TransferBuilder::default();
    let inserted = builder
        .build(store)
        .map_err(|err| IngestError::MalformedFeed {
            feed: "<transfer-builder>".to_string(),
            reason: err.to_string(),
        })?;
    log::info!("transfer builder inserted {} rows", inserted);

    store.set_metadata("updated_at", &Utc::now().to_rfc3339())?;
    Ok(())
}

/// Staleness-gated wrapper: runs the full load only if `updated_at` is
/// absent, older than 24h, or `force` is set. Returns `true` if a load ran.
pub fn update(
    store: &Store,
    feeds: &[(FeedConfig, ArchiveSource)],
    force: bool,
) -> Result<bool> {
    let stale = force || is_stale(store)?;
    if stale {
        load_and_prepare(store, feeds)?;
    }
    Ok(stale)
}

fn is_stale(store: &Store) -> Result<bool> {
    let updated_at = match store.get_metadata("updated_at")? {
        Some(value) => value,
        None => return Ok(true),
    };
    let parsed = match chrono::DateTime::parse_from_rfc3339(&updated_at) {
        Ok(dt) => dt,
        Err(_) => return Ok(true),
    };
    let age = Utc::now().signed_duration_since(parsed.with_timezone(&Utc));
    Ok(age > chrono::Duration::hours(STALE_AFTER_HOURS))
}

#[cfg(test)]
mod test {
    use super::*;

    fn store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();
        (store, dir)
    }

    #[test]
    fn fresh_store_is_stale() {
        let (store, _dir) = store();
        assert!(is_stale(&store).unwrap());
    }

    #[test]
    fn just_updated_store_is_not_stale() {
        let (store, _dir) = store();
        store.set_metadata("updated_at", &Utc::now().to_rfc3339()).unwrap();
        assert!(!is_stale(&store).unwrap());
    }

    #[test]
    fn old_timestamp_is_stale() {
        let (store, _dir) = store();
        let old = Utc::now() - chrono::Duration::hours(48);
        store.set_metadata("updated_at", &old.to_rfc3339()).unwrap();
        assert!(is_stale(&store).unwrap());
    }

    #[test]
    fn empty_feed_list_still_writes_metadata() {
        let (store, _dir) = store();
        load_and_prepare(&store, &[]).unwrap();
        assert!(store.get_metadata("updated_at").unwrap().is_some());
    }
}
