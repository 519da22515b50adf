//! Service-validity caching, per §4.4.2 — the dominant speedup in the
//! original comes from replacing a three-way JOIN per neighbour query with
//! a single `HashSet` containment test, recomputed only when the search
//! frontier crosses into a new local date.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;

use gtfs_store::{CalendarException, CalendarRule};

use crate::error::Result;

#[derive(Debug, Default)]
pub struct ServiceValidityCache {
    last_cached_date: Option<NaiveDate>,
    valid_service_ids: HashSet<String>,
}

impl ServiceValidityCache {
    pub fn new() -> ServiceValidityCache {
        ServiceValidityCache::default()
    }

    /// Returns the `service_id`s valid on `date`, rebuilding the cache first
    /// if the frontier has moved to a date it hasn't seen yet.
    pub fn valid_on(&mut self, conn: &Connection, date: NaiveDate) -> Result<&HashSet<String>> {
        if self.last_cached_date != Some(date) {
            self.rebuild(conn, date)?;
        }
        Ok(&self.valid_service_ids)
    }

    fn rebuild(&mut self, conn: &Connection, date: NaiveDate) -> Result<()> {
        let date_str = date.format("%Y%m%d").to_string();
        let weekday = date.weekday().num_days_from_monday();

        let mut ids = HashSet::new();
        {
            let mut stmt = conn.prepare(
                "SELECT service_id, monday, tuesday, wednesday, thursday, friday, saturday, sunday,
                        start_date, end_date
                 FROM calendar WHERE start_date <= ?1 AND end_date >= ?1",
            )?;
            let mut rows = stmt.query([&date_str])?;
            while let Some(row) = rows.next()? {
                let rule = CalendarRule {
                    service_id: row.get(0)?,
                    monday: row.get(1)?,
                    tuesday: row.get(2)?,
                    wednesday: row.get(3)?,
                    thursday: row.get(4)?,
                    friday: row.get(5)?,
                    saturday: row.get(6)?,
                    sunday: row.get(7)?,
                    start_date: row.get(8)?,
                    end_date: row.get(9)?,
                };
                if rule.runs_on_weekday(weekday) {
                    ids.insert(rule.service_id);
                }
            }
        }
        {
            let mut stmt = conn.prepare(
                "SELECT service_id, exception_type FROM calendar_dates WHERE date = ?1",
            )?;
            let mut rows = stmt.query([&date_str])?;
            let mut exceptions = Vec::new();
            while let Some(row) = rows.next()? {
                let service_id: String = row.get(0)?;
                let exception_type: i64 = row.get(1)?;
                exceptions.push((service_id, CalendarException::from_exception_type(exception_type)));
            }
            // Removes first, then adds, so an add exception always wins over
            // a service's own weekly pattern for the same date.
            for (service_id, exception) in &exceptions {
                if *exception == Some(CalendarException::Removed) {
                    ids.remove(service_id);
                }
            }
            for (service_id, exception) in &exceptions {
                if *exception == Some(CalendarException::Added) {
                    ids.insert(service_id.clone());
                }
            }
        }

        self.valid_service_ids = ids;
        self.last_cached_date = Some(date);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gtfs_store::Store;

    fn store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO calendar (service_id, monday, tuesday, wednesday, thursday, friday,
                    saturday, sunday, start_date, end_date)
                 VALUES ('S', 1, 1, 1, 1, 1, 0, 0, '20250101', '20251231')",
                [],
            )
            .unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO calendar_dates (service_id, date, exception_type) VALUES ('S', '20250715', 2)",
                [],
            )
            .unwrap();
        (store, dir)
    }

    #[test]
    fn monday_within_range_is_valid() {
        let (store, _dir) = store();
        let mut cache = ServiceValidityCache::new();
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        let valid = cache.valid_on(store.connection(), date).unwrap();
        assert!(valid.contains("S"));
    }

    #[test]
    fn removed_exception_date_is_not_valid() {
        let (store, _dir) = store();
        let mut cache = ServiceValidityCache::new();
        let date = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        let valid = cache.valid_on(store.connection(), date).unwrap();
        assert!(!valid.contains("S"));
    }

    #[test]
    fn added_exception_outside_weekday_pattern_is_valid() {
        let (store, _dir) = store();
        store
            .connection()
            .execute(
                "INSERT INTO calendar_dates (service_id, date, exception_type) VALUES ('S', '20250719', 1)",
                [],
            )
            .unwrap();
        let mut cache = ServiceValidityCache::new();
        // 2025-07-19 is a Saturday, flagged 0 in the weekly pattern above.
        let date = NaiveDate::from_ymd_opt(2025, 7, 19).unwrap();
        let valid = cache.valid_on(store.connection(), date).unwrap();
        assert!(valid.contains("S"));
    }

    #[test]
    fn cache_is_rebuilt_when_the_date_changes() {
        let (store, _dir) = store();
        let mut cache = ServiceValidityCache::new();
        let monday = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        let tuesday_after_removal = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        assert!(cache.valid_on(store.connection(), monday).unwrap().contains("S"));
        assert!(!cache.valid_on(store.connection(), tuesday_after_removal).unwrap().contains("S"));
    }
}
