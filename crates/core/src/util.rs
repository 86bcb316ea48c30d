use time::OffsetDateTime;
use ulid::Ulid;

/// Wall-clock unix milliseconds, stamped on each loaded snapshot.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Fresh `run_id` for the log lines of one delete batch.
pub fn new_ulid() -> Ulid {
    Ulid::new()
}
