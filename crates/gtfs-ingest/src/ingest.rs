use std::io::{Cursor, Read, Seek};
use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::{IngestError, Result};
use crate::table::{TableSpec, TABLES};

/// Where a feed's zip archive comes from. Downloading archives over HTTP is
/// an out-of-scope collaborator concern (§1); this crate only knows how to
/// read one once it is on disk or already in memory.
pub enum ArchiveSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

impl ArchiveSource {
    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        match self {
            ArchiveSource::Path(path) => Ok(Box::new(std::fs::File::open(path)?)),
            ArchiveSource::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
        }
    }
}

/// Rewrites a raw GTFS identifier into its namespaced form. Applied to every
/// column whose name ends in `_id`; empty values stay empty rather than
/// becoming the literal string `"03/"`.
pub fn prefix_id(feed_index: usize, raw: &str) -> String {
    if raw.is_empty() {
        String::new()
    } else {
        format!("{:02}/{}", feed_index, raw)
    }
}

fn bind_value(column: &str, feed_index: usize, raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if column.ends_with("_id") {
        Some(prefix_id(feed_index, raw))
    } else {
        Some(raw.to_string())
    }
}

/// Ingests one GTFS table file from an already-open archive entry. Returns
/// the number of rows inserted (including ones silently ignored by
/// `INSERT OR IGNORE`, since distinguishing those would need a second
/// round-trip the original importer doesn't bother with either).
fn ingest_table(
    conn: &Connection,
    feed_name: &str,
    feed_index: usize,
    spec: &TableSpec,
    reader: impl Read,
) -> Result<usize> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = csv_reader
        .headers()
        .map_err(|err| IngestError::MalformedFeed {
            feed: feed_name.to_string(),
            reason: format!("{}: {}", spec.filename, err),
        })?
        .clone();

    if header.is_empty() {
        return Err(IngestError::MalformedFeed {
            feed: feed_name.to_string(),
            reason: format!("{} has no header row", spec.filename),
        });
    }

    // Intersect the feed's columns with the ones this table's schema knows
    // about, in schema order, so the INSERT column list is always valid SQL.
    let present: Vec<(&str, usize)> = spec
        .columns
        .iter()
        .filter_map(|&col| header.iter().position(|h| h == col).map(|idx| (col, idx)))
        .collect();

    if present.is_empty() {
        log::warn!(
            "{}: {} has no recognised columns, skipping",
            feed_name,
            spec.filename
        );
        return Ok(0);
    }

    let column_list = present
        .iter()
        .map(|(col, _)| *col)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=present.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
        spec.table, column_list, placeholders
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut count = 0;
    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                log::warn!("{}: skipping unparsable row in {}: {}", feed_name, spec.filename, err);
                continue;
            }
        };
        let values: Vec<Option<String>> = present
            .iter()
            .map(|(col, idx)| {
                let raw = record.get(*idx).unwrap_or("");
                bind_value(col, feed_index, raw)
            })
            .collect();
        let params: Vec<&dyn rusqlite::ToSql> =
            values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
        stmt.execute(params.as_slice())?;
        count += 1;
    }
    Ok(count)
}

/// Ingests every recognised GTFS table file found in one feed's archive.
/// Missing files are skipped silently (a feed may omit `shapes.txt`); a
/// corrupt/unreadable zip fails the whole feed with `MalformedFeed`.
pub fn ingest_feed(
    conn: &Connection,
    feed_name: &str,
    feed_index: usize,
    source: &ArchiveSource,
) -> Result<()> {
    let reader = source.open()?;
    let mut archive = zip::ZipArchive::new(reader).map_err(|err| IngestError::MalformedFeed {
        feed: feed_name.to_string(),
        reason: err.to_string(),
    })?;

    for spec in TABLES {
        let file = match archive.by_name(spec.filename) {
            Ok(file) => file,
            Err(_) => continue,
        };
        match ingest_table(conn, feed_name, feed_index, spec, file) {
            Ok(count) => log::info!("{}: ingested {} rows from {}", feed_name, count, spec.filename),
            Err(err) => log::warn!("{}: {}", feed_name, err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use gtfs_store::Store;
    use std::io::Write;

    #[test]
    fn prefix_id_leaves_empty_values_alone() {
        assert_eq!(prefix_id(3, ""), "");
        assert_eq!(prefix_id(3, "A"), "03/A");
        assert_eq!(prefix_id(12, "X1"), "12/X1");
    }

    fn zip_with_stops_txt(csv_body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("stops.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(csv_body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn ingested_stop_id_carries_feed_index_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();

        let bytes = zip_with_stops_txt("stop_id,stop_name,stop_lat,stop_lon\nA,X,1.0,2.0\n");
        let source = ArchiveSource::Bytes(bytes);
        ingest_feed(store.connection(), "feed-three", 3, &source).unwrap();

        let stop = store.open_session().get_stop("03/A").unwrap();
        assert_eq!(stop.stop_name, "X");
    }

    #[test]
    fn missing_header_is_malformed_but_other_files_still_process() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();

        let bytes = zip_with_stops_txt("");
        let source = ArchiveSource::Bytes(bytes);
        // An empty table file must not panic or abort the whole feed.
        ingest_feed(store.connection(), "feed-empty", 0, &source).unwrap();
    }

    #[test]
    fn repeated_ingestion_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();

        let bytes = zip_with_stops_txt("stop_id,stop_name,stop_lat,stop_lon\nA,X,1.0,2.0\n");
        ingest_feed(store.connection(), "feed", 0, &ArchiveSource::Bytes(bytes.clone())).unwrap();
        ingest_feed(store.connection(), "feed", 0, &ArchiveSource::Bytes(bytes)).unwrap();

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM stops", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
