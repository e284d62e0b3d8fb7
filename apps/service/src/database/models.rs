use std::time::Duration;

use chrono::{DateTime, Utc};
use libsql::Row;

use crate::error::StorageError;
use crate::monitoring::types::{ProbeErrorKind, ProbeOutcome};

/// Column list matching [`outcome_from_row`]
pub const OUTCOME_COLUMNS: &str =
    "timestamp_ns, host, success, latency_ns, error_kind, error_message";

/// Convert a timestamp to stored nanoseconds
pub fn timestamp_to_nanos(time: DateTime<Utc>) -> Result<i64, StorageError> {
    time.timestamp_nanos_opt().ok_or(StorageError::OutOfRange("timestamp"))
}

/// Convert stored nanoseconds back to a timestamp
pub fn nanos_to_timestamp(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

/// Convert a query bound, saturating outside the storable range
pub fn bound_to_nanos(time: DateTime<Utc>) -> i64 {
    time.timestamp_nanos_opt()
        .unwrap_or(if time.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

pub fn latency_to_nanos(latency: Duration) -> Result<i64, StorageError> {
    i64::try_from(latency.as_nanos()).map_err(|_| StorageError::OutOfRange("latency"))
}

/// Build a [`ProbeOutcome`] from a row selected with [`OUTCOME_COLUMNS`]
pub fn outcome_from_row(row: &Row) -> Result<ProbeOutcome, StorageError> {
    let timestamp: i64 = row.get(0)?;
    let latency: Option<i64> = row.get(3)?;
    let error_kind: Option<String> = row.get(4)?;

    let latency = latency
        .map(|ns| {
            u64::try_from(ns)
                .map(Duration::from_nanos)
                .map_err(|_| StorageError::Corrupt(format!("negative latency {ns}")))
        })
        .transpose()?;

    let error_kind = error_kind
        .map(|kind| kind.parse::<ProbeErrorKind>().map_err(StorageError::Corrupt))
        .transpose()?;

    Ok(ProbeOutcome {
        timestamp: nanos_to_timestamp(timestamp),
        host: row.get(1)?,
        success: row.get::<i64>(2)? != 0,
        latency,
        error_kind,
        error_message: row.get(5)?,
    })
}
