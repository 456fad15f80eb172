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

//! Non-blocking fan-in from response pickers to a [`RepairSink`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::record::RepairRecord;
use crate::sink::RepairSink;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Queues repair records and drains them to a [`RepairSink`] on a background task.
///
/// `send` never blocks the caller (a response picker): if the queue is full the record is
/// dropped and [`SyncSender::dropped_count`] is incremented. Repair is best-effort by design —
/// losing a record under load is preferable to stalling request handling.
pub struct SyncSender {
    tx: mpsc::Sender<RepairRecord>,
    dropped: Arc<AtomicU64>,
    drainer: JoinHandle<()>,
}

impl SyncSender {
    /// Spawns the background drainer writing to `sink`, with the default queue capacity.
    pub fn new(sink: Arc<dyn RepairSink>) -> Self {
        Self::with_capacity(sink, DEFAULT_QUEUE_CAPACITY)
    }

    /// Spawns the background drainer with an explicit bounded queue capacity.
    pub fn with_capacity(sink: Arc<dyn RepairSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<RepairRecord>(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let drainer = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(err) = sink.write(&record).await {
                    warn!(error = %err, object_path = %record.object_path, "failed to write repair record");
                }
            }
        });

        Self { tx, dropped, drainer }
    }

    /// Queues `record` for the background drainer. Never blocks; drops the record and counts
    /// it if the queue is currently full.
    pub fn send(&self, record: RepairRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(object_path = %record.object_path, "repair queue full, dropping record");
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                debug!(object_path = %record.object_path, "repair sender closed, dropping record");
            }
        }
    }

    /// Number of records dropped so far because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Closes the input side and waits up to a bounded grace period for the drainer to flush
    /// whatever is already queued, then abandons the rest.
    pub async fn close(self) {
        drop(self.tx);
        if tokio::time::timeout(DEFAULT_CLOSE_GRACE_PERIOD, self.drainer)
            .await
            .is_err()
        {
            warn!("repair drainer did not flush within grace period, abandoning remaining records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CollectingSink(Mutex<Vec<RepairRecord>>);

    #[async_trait]
    impl RepairSink for CollectingSink {
        async fn write(&self, record: &RepairRecord) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn record(object_path: &str) -> RepairRecord {
        RepairRecord {
            object_path: object_path.into(),
            source_backend: "b1".into(),
            target_backend: "b2".into(),
            method: "PUT".into(),
            request_id: "req-1".into(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_queued_records_to_the_sink() {
        let sink = Arc::new(CollectingSink(Mutex::new(Vec::new())));
        let sender = SyncSender::new(sink.clone());

        sender.send(record("/bucket/a"));
        sender.send(record("/bucket/b"));
        sender.close().await;

        let written = sink.0.lock().unwrap();
        assert_eq!(written.len(), 2);
    }

    #[tokio::test]
    async fn drops_and_counts_when_queue_is_full() {
        let sink = Arc::new(CollectingSink(Mutex::new(Vec::new())));
        let sender = SyncSender::with_capacity(sink, 1);

        // Neither send yields to the scheduler, so the drainer has no chance to empty the
        // buffer between them: the first fills it, the second must be dropped.
        sender.send(record("/bucket/a"));
        sender.send(record("/bucket/b"));
        assert_eq!(sender.dropped_count(), 1);
    }
}
