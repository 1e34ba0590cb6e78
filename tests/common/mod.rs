// tests/common/mod.rs

#![allow(dead_code)]

use std::io::Write;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::NamedTempFile;

/// Fixed provenance timestamp so compiled graphs compare equal.
pub fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Write `contents` to a temporary `.toml` file kept alive by the handle.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}
