use tracing::debug;

use crate::analyzers::aggregate::{
    ROLLING_WINDOW, daily_totals, overall_mean, rolling_average, trip_durations,
};
use crate::analyzers::types::{AggregateMode, AggregateResult, Processed};
use crate::trip::Trip;

/// Runs the aggregation chain for one mode.
///
/// Durations and daily totals are always computed. `Mean` then reduces the
/// daily series to its mean; `Rolling` attaches a trailing average over
/// [`ROLLING_WINDOW`] rows.
pub fn process(trips: &[Trip], mode: AggregateMode) -> Processed {
    let durations = trip_durations(trips);
    let daily = daily_totals(&durations);

    let result = match mode {
        AggregateMode::Mean => AggregateResult::Mean(overall_mean(&daily)),
        AggregateMode::Rolling => AggregateResult::Rolling(rolling_average(&daily, ROLLING_WINDOW)),
    };
    debug!(trips = trips.len(), days = daily.len(), ?mode, "Aggregation complete");

    Processed {
        durations,
        daily,
        result,
    }
}
