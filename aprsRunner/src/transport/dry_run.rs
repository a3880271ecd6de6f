use std::io::{self, Stdout, Write};

use tracing::info;

use crate::transport::error::TransportResult;
use crate::utils::traits::Transport;

/// Prints packets as `TX: <packet>` instead of opening a session.
pub struct DryRunTransport<W: Write = Stdout> {
    out: W,
    sent: usize,
}

impl DryRunTransport<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DryRunTransport<W> {
    pub fn new(out: W) -> Self {
        Self { out, sent: 0 }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Transport for DryRunTransport<W> {
    fn connect(&mut self) -> TransportResult<()> {
        info!("DRY RUN - not connecting to APRS-IS");
        Ok(())
    }

    fn send(&mut self, packet: &str) -> TransportResult<()> {
        writeln!(self.out, "TX: {}", packet)?;
        self.out.flush()?;
        self.sent += 1;
        Ok(())
    }

    fn close(&mut self) {}
}
