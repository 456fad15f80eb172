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

//! Append-only destinations for [`RepairRecord`]s.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::record::RepairRecord;

/// Failure writing a record to a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink's backing file or connection could not be written to.
    #[error("repair sink write failed: {0}")]
    Write(String),
    /// The record could not be serialized.
    #[error("repair record serialization failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where repair records end up. Implementations must be cheap to call repeatedly and must
/// not block the caller for long — the sender already treats the queue as best-effort.
#[async_trait]
pub trait RepairSink: Send + Sync {
    /// Appends one record to the sink.
    async fn write(&self, record: &RepairRecord) -> Result<(), SinkError>;
}

/// Writes one JSON object per line to a file, opened in append mode.
///
/// This is the default sink: operators tail or ship the file with whatever log pipeline
/// they already run.
pub struct JsonLinesFileSink {
    path: PathBuf,
}

impl JsonLinesFileSink {
    /// Targets `path`, creating it on first write if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RepairSink for JsonLinesFileSink {
    async fn write(&self, record: &RepairRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::Write(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| SinkError::Write(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repair.jsonl");
        let sink = JsonLinesFileSink::new(&path);

        let record = RepairRecord {
            object_path: "/bucket/key".into(),
            source_backend: "b1".into(),
            target_backend: "b2".into(),
            method: "PUT".into(),
            request_id: "req-1".into(),
            timestamp: chrono::Utc::now(),
        };
        sink.write(&record).await.unwrap();
        sink.write(&record).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().contains("/bucket/key"));
    }
}
