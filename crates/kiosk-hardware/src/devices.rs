//! Enum wrapper for reader dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn ChipReader>`
//! is not available. The concrete reader is picked at startup (console entry
//! in testing mode, otherwise the attached driver) and wrapped in
//! [`AnyReader`] so the scan loop stays monomorphic.
//!
//! # Examples
//!
//! ```
//! use kiosk_hardware::devices::AnyReader;
//! use kiosk_hardware::mock::MockReader;
//!
//! let (reader, _handle) = MockReader::new();
//! let any_reader = AnyReader::Mock(reader);
//! ```

use crate::console::ConsoleReader;
use crate::mock::MockReader;
use crate::traits::ChipReader;
use crate::{ReaderInfo, Result};
use kiosk_core::Uid;
use tokio::io::{BufReader, Stdin, Stdout};

/// Enum wrapper for chip reader dispatch.
#[non_exhaustive]
pub enum AnyReader {
    /// Mock reader for development and testing.
    Mock(MockReader),
    /// Manual UID entry on standard input.
    Console(ConsoleReader<BufReader<Stdin>, Stdout>),
}

impl ChipReader for AnyReader {
    async fn try_read(&mut self) -> Result<Option<Uid>> {
        match self {
            Self::Mock(device) => device.try_read().await,
            Self::Console(device) => device.try_read().await,
        }
    }

    async fn feedback(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.feedback().await,
            Self::Console(device) => device.feedback().await,
        }
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(device) => device.get_reader_info().await,
            Self::Console(device) => device.get_reader_info().await,
        }
    }

    fn is_manual(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_manual(),
            Self::Console(device) => device.is_manual(),
        }
    }
}
