use chrono::{DateTime, Utc};

/// Timestamp qualifier used in storage keys and `createdAt` fields.
/// Second resolution: two builds of the same package name within the same
/// second produce the same key. Known collision risk, accepted.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

pub fn build_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

pub fn layer_key(prefix: &str, package_name: &str, timestamp: &str) -> String {
    format!("{prefix}/{package_name}-{timestamp}.zip")
}

pub fn metadata_key(prefix: &str, package_name: &str, timestamp: &str) -> String {
    format!("{prefix}/{package_name}-{timestamp}.json")
}
