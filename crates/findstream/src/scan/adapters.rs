//! Consumer-facing shapes for a scan.

use futures_util::stream::{self, Stream};
use tokio::sync::mpsc;

use super::{Entry, Scan};
use crate::error::Result;

impl Scan {
    /// Turns the scan into a stream that advances only when polled.
    pub fn into_stream(self) -> impl Stream<Item = Result<Entry>> + Send {
        stream::unfold(self, |mut scan| async move {
            let item = scan.next().await?;
            Some((item, scan))
        })
    }

    /// Runs the scan to the end and returns every entry.
    ///
    /// Skipped nodes do not fail the collection; a root failure does.
    pub async fn collect_entries(mut self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        while let Some(item) = self.next().await {
            entries.push(item?);
        }
        Ok(entries)
    }

    /// Moves the scan to a spawned task that feeds a bounded channel.
    ///
    /// The producer runs at most `capacity` entries ahead of the receiver
    /// and stops once the receiver is dropped. Must be called from within a
    /// tokio runtime.
    pub fn into_channel(mut self, capacity: usize) -> mpsc::Receiver<Result<Entry>> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(async move {
            while let Some(item) = self.next().await {
                if sender.send(item).await.is_err() {
                    tracing::debug!("scan receiver dropped");
                    break;
                }
            }
        });
        receiver
    }
}
