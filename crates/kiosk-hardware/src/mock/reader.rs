//! Mock chip reader implementation for testing and development.
//!
//! This module provides a simulated reader that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{HardwareError, Result, traits::ChipReader, types::ReaderInfo};
use kiosk_core::Uid;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Mock chip reader for testing and development.
///
/// Chips presented through the paired [`MockReaderHandle`] are queued and
/// handed out one per [`try_read`](ChipReader::try_read) call. An empty queue
/// reads as "no chip in the field".
///
/// # Examples
///
/// ```
/// use kiosk_hardware::mock::MockReader;
/// use kiosk_hardware::traits::ChipReader;
/// use kiosk_core::Uid;
///
/// #[tokio::main]
/// async fn main() -> kiosk_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///
///     assert!(reader.try_read().await?.is_none());
///
///     handle.present_chip(Uid::new("abc123")?).await?;
///     let uid = reader.try_read().await?.unwrap();
///     assert_eq!(uid.as_str(), "abc123");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for chip events
    event_rx: mpsc::Receiver<ChipEvent>,

    /// Device name
    name: String,

    /// Number of feedback (buzz) calls, shared with the handle
    feedback_count: Arc<AtomicUsize>,
}

impl MockReader {
    /// Create a new mock reader with the default name.
    ///
    /// Returns a tuple of (MockReader, MockReaderHandle) where the handle
    /// can be used to simulate chip presentations.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock Chip Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let feedback_count = Arc::new(AtomicUsize::new(0));

        let reader = Self {
            event_rx,
            name: name.clone(),
            feedback_count: Arc::clone(&feedback_count),
        };

        let handle = MockReaderHandle {
            event_tx,
            name,
            feedback_count,
        };

        (reader, handle)
    }
}

impl ChipReader for MockReader {
    async fn try_read(&mut self) -> Result<Option<Uid>> {
        match self.event_rx.try_recv() {
            Ok(ChipEvent::Presented(uid)) => Ok(Some(uid)),
            Ok(ChipEvent::Fault(message)) => Err(HardwareError::communication(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HardwareError::disconnected(&self.name)),
        }
    }

    async fn feedback(&mut self) -> Result<()> {
        self.feedback_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new(self.name.clone(), vec!["ISO14443A".to_string()]))
    }
}

/// Internal event type for the mock reader.
#[derive(Debug, Clone)]
enum ChipEvent {
    Presented(Uid),
    Fault(String),
}

/// Handle for controlling a mock reader.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    /// Channel sender for chip events
    event_tx: mpsc::Sender<ChipEvent>,

    /// Device name
    name: String,

    feedback_count: Arc<AtomicUsize>,
}

impl MockReaderHandle {
    /// Present a chip to the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_chip(&self, uid: Uid) -> Result<()> {
        self.send(ChipEvent::Presented(uid)).await
    }

    /// Make the next read fail with a communication error.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn fail_next_read(&self, message: impl Into<String>) -> Result<()> {
        self.send(ChipEvent::Fault(message.into())).await
    }

    /// Number of times the reader gave physical feedback.
    pub fn feedback_count(&self) -> usize {
        self.feedback_count.load(Ordering::SeqCst)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: ChipEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("chip event channel closed"))
    }
}
