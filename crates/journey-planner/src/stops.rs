//! Stop name search (§4.4.8).

use rusqlite::Connection;

use crate::error::Result;

/// A city-specific re-ranking rule for `search_stop_custom`. This is a
/// configuration surface, not a data dependency — it is hand-maintained and
/// never derived from a feed.
pub struct CityFeedPreference {
    pub city_prefix: &'static str,
    pub prefer_raw_prefixes: &'static [&'static str],
    pub deprioritize_raw_prefixes: &'static [&'static str],
}

pub const CITY_FEED_PREFERENCES: &[CityFeedPreference] = &[
    CityFeedPreference {
        city_prefix: "paris",
        prefer_raw_prefixes: &["IDFM"],
        deprioritize_raw_prefixes: &[],
    },
    CityFeedPreference {
        city_prefix: "lyon",
        prefer_raw_prefixes: &[],
        deprioritize_raw_prefixes: &["IDFM"],
    },
];

fn raw_suffix(id: &str) -> &str {
    match id.find('/') {
        Some(idx) => &id[idx + 1..],
        None => id,
    }
}

/// Up to `limit` `(stop_id, stop_name)` pairs whose name contains `prefix`
/// case-insensitively, prefix matches ranked above mere substring matches.
pub fn search_stop(conn: &Connection, prefix: &str, limit: usize) -> Result<Vec<(String, String)>> {
    let like_anywhere = format!("%{}%", prefix);
    let like_prefix = format!("{}%", prefix);
    let mut stmt = conn.prepare(
        "SELECT stop_id, stop_name FROM stops
         WHERE stop_name LIKE ?1 ESCAPE '\\' COLLATE NOCASE
         ORDER BY CASE WHEN stop_name LIKE ?2 ESCAPE '\\' COLLATE NOCASE THEN 0 ELSE 1 END, stop_name
         LIMIT ?3",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![like_anywhere, like_prefix, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn preference_for(prefix: &str) -> Option<&'static CityFeedPreference> {
    let lower = prefix.to_lowercase();
    CITY_FEED_PREFERENCES
        .iter()
        .find(|pref| lower.starts_with(pref.city_prefix))
}

/// Same results as `search_stop`, re-ranked when `prefix` matches a known
/// city preference: preferred feed ids float to the top, deprioritized ones
/// sink to the bottom, everything else keeps its relative order.
pub fn search_stop_custom(conn: &Connection, prefix: &str, limit: usize) -> Result<Vec<(String, String)>> {
    let preference = match preference_for(prefix) {
        Some(pref) => pref,
        None => return search_stop(conn, prefix, limit),
    };

    let candidates = search_stop(conn, prefix, limit.saturating_mul(4).max(limit))?;
    let rank = |stop_id: &str| -> i32 {
        let raw = raw_suffix(stop_id);
        if preference.prefer_raw_prefixes.iter().any(|p| raw.starts_with(p)) {
            0
        } else if preference.deprioritize_raw_prefixes.iter().any(|p| raw.starts_with(p)) {
            2
        } else {
            1
        }
    };
    let mut ranked = candidates;
    ranked.sort_by_key(|(stop_id, _)| rank(stop_id));
    ranked.truncate(limit);
    Ok(ranked)
}

#[cfg(test)]
mod test {
    use super::*;
    use gtfs_store::Store;

    fn store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite")).unwrap();
        store.ensure_schema().unwrap();
        let conn = store.connection();
        for (stop_id, name) in [
            ("01/IDFM:1", "Gare de Lyon"),
            ("02/SNCF:1", "Lyon Part-Dieu"),
            ("03/X:1", "Port of Lyonesse"),
        ] {
            conn.execute(
                "INSERT INTO stops (stop_id, stop_name, stop_lat, stop_lon) VALUES (?1, ?2, 0, 0)",
                rusqlite::params![stop_id, name],
            ).unwrap();
        }
        (store, dir)
    }

    #[test]
    fn prefix_matches_rank_above_substring_matches() {
        let (store, _dir) = store();
        let results = search_stop(store.connection(), "Lyon", 10).unwrap();
        assert_eq!(results[0].1, "Lyon Part-Dieu");
    }

    #[test]
    fn lyon_preference_deprioritizes_idfm_ids() {
        let (store, _dir) = store();
        let results = search_stop_custom(store.connection(), "lyon", 10).unwrap();
        let idfm_rank = results.iter().position(|(id, _)| id.starts_with("01/IDFM")).unwrap();
        let other_rank = results.iter().position(|(id, _)| id.starts_with("02/SNCF")).unwrap();
        assert!(other_rank < idfm_rank);
    }

    #[test]
    fn unconfigured_city_falls_back_to_plain_search() {
        let (store, _dir) = store();
        let plain = search_stop(store.connection(), "Gare", 10).unwrap();
        let custom = search_stop_custom(store.connection(), "Gare", 10).unwrap();
        assert_eq!(plain, custom);
    }
}
