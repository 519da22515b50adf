use crate::error::{PlannerError, Result};

/// The two route-selection strategies the original supports. `Mode` is the
/// only thing a caller picks; every other constant below follows from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fastest,
    LeastTransfers,
}

impl std::str::FromStr for Mode {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Mode> {
        match s {
            "fastest" => Ok(Mode::Fastest),
            "least_transfers" => Ok(Mode::LeastTransfers),
            other => Err(PlannerError::InvalidInput(format!("unknown mode: {}", other))),
        }
    }
}

/// The heuristic's tunable weights, per §4.4.5. Deliberately `pub` rather
/// than buried as literals inside `search.rs`: the heuristic is documented
/// as inadmissible on purpose, and callers who hit its pathological cases
/// need to be able to retune it without touching the search loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub v_assumed_kmh: f64,
    pub p_ride_base_minutes: f64,
    pub p_transfer_multiplier: f64,
    pub max_rides: u32,
    pub search_window_seconds: i64,
    pub max_execution_time_seconds: u64,
}

impl SearchParams {
    pub fn for_mode(mode: Mode) -> SearchParams {
        match mode {
            Mode::Fastest => SearchParams {
                v_assumed_kmh: 100.0,
                p_ride_base_minutes: 3.0,
                p_transfer_multiplier: 1.5,
                max_rides: 20,
                search_window_seconds: 3600,
                max_execution_time_seconds: 60,
            },
            Mode::LeastTransfers => SearchParams {
                v_assumed_kmh: 100.0,
                p_ride_base_minutes: 5.0,
                p_transfer_multiplier: 2.0,
                max_rides: 5,
                search_window_seconds: 3600,
                max_execution_time_seconds: 60,
            },
        }
    }

    /// `P_ride(mode, n) = P_base * (1 + n/10)`, in seconds.
    pub fn ride_penalty_seconds(&self, ride_count: u32) -> f64 {
        self.p_ride_base_minutes * 60.0 * (1.0 + ride_count as f64 / 10.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mode_parses_known_strings() {
        assert_eq!(Mode::from_str("fastest").unwrap(), Mode::Fastest);
        assert_eq!(Mode::from_str("least_transfers").unwrap(), Mode::LeastTransfers);
    }

    #[test]
    fn mode_rejects_unknown_strings() {
        assert!(Mode::from_str("shortest").is_err());
    }

    #[test]
    fn fastest_and_least_transfers_use_documented_constants() {
        let fastest = SearchParams::for_mode(Mode::Fastest);
        assert_eq!(fastest.p_ride_base_minutes, 3.0);
        assert_eq!(fastest.p_transfer_multiplier, 1.5);
        assert_eq!(fastest.max_rides, 20);

        let least = SearchParams::for_mode(Mode::LeastTransfers);
        assert_eq!(least.p_ride_base_minutes, 5.0);
        assert_eq!(least.p_transfer_multiplier, 2.0);
        assert_eq!(least.max_rides, 5);
    }

    #[test]
    fn ride_penalty_grows_with_ride_count() {
        let params = SearchParams::for_mode(Mode::Fastest);
        assert_eq!(params.ride_penalty_seconds(0), 180.0);
        assert_eq!(params.ride_penalty_seconds(10), 360.0);
    }
}
