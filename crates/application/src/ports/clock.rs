//! Clock port for cookie expiry

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// The chain reads the clock once per response to decide which `set-cookie`
/// values have already expired. Tests substitute a fixed instant.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
