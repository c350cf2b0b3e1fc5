use chrono::NaiveDateTime;

/// API field holding the pickup timestamp. Also the persisted column name.
pub const PICKUP_FIELD: &str = "tpep_pickup_datetime";
/// API field holding the dropoff timestamp. Also the persisted column name.
pub const DROPOFF_FIELD: &str = "tpep_dropoff_datetime";

/// A single taxi trip, timezone-naive.
///
/// `dropoff >= pickup` is not enforced; the source data contains trips that
/// end before they start and those are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trip {
    pub pickup: NaiveDateTime,
    pub dropoff: NaiveDateTime,
}

impl Trip {
    pub fn new(pickup: NaiveDateTime, dropoff: NaiveDateTime) -> Self {
        Self { pickup, dropoff }
    }
}
