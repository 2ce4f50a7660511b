//! Chip reader abstraction layer for the device check-out kiosk.
//!
//! The kiosk only needs two things from its reader: attempt a read, and buzz
//! once a read has been accepted. [`ChipReader`] captures exactly that so the
//! scan loop can run against the physical driver, a console prompt (manual
//! test entry) or a programmable mock.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: The trait requires `Send + Sync` for use with Tokio.
//! - **Enum dispatch**: [`AnyReader`] selects the concrete reader at startup.
//!
//! # Examples
//!
//! ```no_run
//! use kiosk_hardware::traits::ChipReader;
//! use kiosk_hardware::error::Result;
//!
//! async fn poll_once<R: ChipReader>(reader: &mut R) -> Result<()> {
//!     if let Some(uid) = reader.try_read().await? {
//!         reader.feedback().await?;
//!         println!("Read {uid}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`ChipReader`]: traits::ChipReader
//! [`AnyReader`]: devices::AnyReader

pub mod console;
pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use console::ConsoleReader;
pub use devices::AnyReader;
pub use error::{HardwareError, Result};
pub use traits::ChipReader;
pub use types::ReaderInfo;
