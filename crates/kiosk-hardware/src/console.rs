//! Manual UID entry for testing the kiosk without a reader attached.
//!
//! Each poll prompts for a UID and waits for a line of input. Since a human
//! is typing, reads are marked as manual so the scan loop neither debounces
//! them nor buzzes.

use crate::{HardwareError, Result, traits::ChipReader, types::ReaderInfo};
use kiosk_core::Uid;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::{debug, warn};

const PROMPT: &[u8] = b"Enter UID: ";

/// Reader that takes UIDs from a line-oriented input.
pub struct ConsoleReader<I, O> {
    lines: Lines<I>,
    out: O,
    closed: bool,
}

impl ConsoleReader<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Read UIDs from the process' standard input.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<I, O> ConsoleReader<I, O>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(input: I, out: O) -> Self {
        Self {
            lines: input.lines(),
            out,
            closed: false,
        }
    }

    /// Get the prompt output, mostly useful in tests.
    pub fn output(&self) -> &O {
        &self.out
    }
}

impl<I, O> ChipReader for ConsoleReader<I, O>
where
    I: AsyncBufRead + Unpin + Send + Sync,
    O: AsyncWrite + Unpin + Send + Sync,
{
    async fn try_read(&mut self) -> Result<Option<Uid>> {
        if self.closed {
            return Ok(None);
        }

        self.out.write_all(PROMPT).await?;
        self.out.flush().await?;

        match self.lines.next_line().await? {
            Some(line) if line.trim().is_empty() => Ok(None),
            Some(line) => {
                let uid = Uid::new(&line)?;
                debug!(uid = %uid, "Manual UID entered");
                Ok(Some(uid))
            }
            None => {
                warn!("Console input closed, no more UIDs will be read");
                self.closed = true;
                Err(HardwareError::disconnected("console input"))
            }
        }
    }

    async fn feedback(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new("Console", vec![]))
    }

    fn is_manual(&self) -> bool {
        true
    }
}
