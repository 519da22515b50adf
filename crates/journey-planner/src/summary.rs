//! A plain-English itinerary renderer (§4.4.9, supplement). The original's
//! `get_journey_summary`/`get_journey_summary_fr` demonstrate this as a
//! debugging/CLI-demo aid built directly from steps with no extra store
//! access; this carries only the English half, as a thin `Display`-style
//! convenience for the CLI, not the multi-language narrative the Non-goals
//! exclude.

use crate::steps::JourneyStep;

/// Renders a step list as human-readable lines, e.g.:
/// "Board the 1 (Downtown) at Alpha 08:00, alight at Beta 08:10."
/// "Walk from Beta to Gamma (3 min)."
pub fn summarize(steps: &[JourneyStep]) -> String {
    if steps.is_empty() {
        return "Already there.".to_string();
    }
    steps.iter().map(summarize_step).collect::<Vec<_>>().join("\n")
}

fn summarize_step(step: &JourneyStep) -> String {
    match step {
        JourneyStep::Ride(ride) => {
            let label = ride
                .route_short_name
                .clone()
                .or_else(|| ride.route_long_name.clone())
                .unwrap_or_else(|| "service".to_string());
            let headsign = ride
                .trip_headsign
                .as_ref()
                .map(|h| format!(" ({})", h))
                .unwrap_or_default();
            format!(
                "Board the {}{} at {} {}, alight at {} {}.",
                label,
                headsign,
                ride.from_stop_name,
                ride.departure.format("%H:%M"),
                ride.to_stop_name,
                ride.arrival.format("%H:%M"),
            )
        }
        JourneyStep::Transfer(transfer) => {
            let minutes = (transfer.arrival - transfer.departure).num_minutes();
            format!(
                "Walk from {} to {} ({} min).",
                transfer.from_stop_name, transfer.to_stop_name, minutes
            )
        }
    }
}
