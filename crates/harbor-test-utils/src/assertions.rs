// Harbor - S3-compatible replicating reverse proxy
// Copyright (C) 2026 Harbor Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Custom test assertions for Harbor integration tests.

use std::path::Path;
use std::time::Duration;

use harbor_backend::ProxyResponse;
use harbor_sync::RepairRecord;

/// Assert that a dispatch response has the expected status.
pub fn assert_status(resp: &ProxyResponse, expected: http::StatusCode) {
    assert_eq!(
        resp.status, expected,
        "expected status {expected}, got {}",
        resp.status
    );
}

/// Reads every repair record currently written to a [`harbor_sync::JsonLinesFileSink`]'s log.
///
/// Returns an empty vec if the file does not exist yet (no repair has been written).
pub fn read_repair_records(sink_path: &Path) -> Vec<RepairRecord> {
    let Ok(contents) = std::fs::read_to_string(sink_path) else {
        return Vec::new();
    };
    contents
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).expect("repair record line is valid JSON"))
        .collect()
}

/// Polls the repair sink until at least `expected_count` records have landed or `timeout`
/// elapses.
///
/// The sync sender drains onto a background task, so a record written by a dispatch may not
/// be on disk the instant `dispatch` returns; tests should poll rather than read once.
pub async fn wait_for_repair_records(
    sink_path: &Path,
    expected_count: usize,
    timeout: Duration,
) -> Vec<RepairRecord> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let records = read_repair_records(sink_path);
        if records.len() >= expected_count || tokio::time::Instant::now() >= deadline {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Assert that a repair record exists targeting `target_backend` for `object_path`.
pub fn assert_repair_targets(records: &[RepairRecord], object_path: &str, target_backend: &str) {
    assert!(
        records
            .iter()
            .any(|r| r.object_path == object_path && r.target_backend == target_backend),
        "no repair record for {object_path} targeting {target_backend} in {records:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(object_path: &str, target: &str) -> RepairRecord {
        RepairRecord {
            object_path: object_path.to_string(),
            source_backend: "b1".to_string(),
            target_backend: target.to_string(),
            method: "PUT".to_string(),
            request_id: "req-1".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn reads_back_written_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repair.jsonl");
        let line = serde_json::to_string(&record("/bucket/key", "b2")).unwrap();
        std::fs::write(&path, format!("{line}\n")).unwrap();

        let records = read_repair_records(&path);
        assert_eq!(records.len(), 1);
        assert_repair_targets(&records, "/bucket/key", "b2");
    }

    #[test]
    fn missing_sink_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_repair_records(&dir.path().join("missing.jsonl"));
        assert!(records.is_empty());
    }
}
