//! Chip reader trait definition.
//!
//! The reader is an opaque capability for the rest of the kiosk: it can
//! attempt a read and it can give physical feedback (a buzz) once a read has
//! been accepted. Driver details (SPI wiring, antenna resets, anti-collision)
//! live behind this trait.
//!
//! The trait uses native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::ReaderInfo;
use kiosk_core::Uid;

/// Chip reader abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper
/// [`AnyReader`](crate::devices::AnyReader) when the concrete reader is only
/// known at runtime.
///
/// # Examples
///
/// ```no_run
/// use kiosk_hardware::traits::ChipReader;
/// use kiosk_hardware::error::Result;
///
/// async fn wait_for_chip<R: ChipReader>(reader: &mut R) -> Result<String> {
///     loop {
///         if let Some(uid) = reader.try_read().await? {
///             reader.feedback().await?;
///             return Ok(uid.to_string());
///         }
///     }
/// }
/// ```
pub trait ChipReader: Send + Sync {
    /// Attempt a single read.
    ///
    /// Returns `Ok(None)` when no chip is in the field. Implementations must
    /// not wait indefinitely for a chip unless they are interactive (manual
    /// entry), since the scan loop relies on polls returning.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device is disconnected
    /// - The chip answered but its UID could not be decoded
    async fn try_read(&mut self) -> Result<Option<Uid>>;

    /// Acknowledge an accepted read physically (buzzer, LED).
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs.
    async fn feedback(&mut self) -> Result<()>;

    /// Get reader information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while querying
    /// reader information.
    async fn get_reader_info(&self) -> Result<ReaderInfo>;

    /// Whether reads come from a human typing UIDs rather than a chip.
    ///
    /// Manual entries bypass debouncing and physical feedback.
    fn is_manual(&self) -> bool {
        false
    }
}
