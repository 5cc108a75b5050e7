//! In-memory serial line used by the unit tests.

use crate::base::BusLine;
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct MockLine {
    rx: VecDeque<u8>,
    written: Vec<u8>,
    echo: bool,
    break_active: bool,
    break_count: usize,
    break_started: Option<Instant>,
    break_holds: Vec<Duration>,
    read_error: Option<io::ErrorKind>,
    write_error: Option<io::ErrorKind>,
}

impl MockLine {
    pub fn new() -> MockLine {
        MockLine::default()
    }

    /// Half-duplex behaviour: everything written shows up on the read side.
    pub fn with_echo() -> MockLine {
        MockLine {
            echo: true,
            ..Default::default()
        }
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    pub fn break_active(&self) -> bool {
        self.break_active
    }

    pub fn break_count(&self) -> usize {
        self.break_count
    }

    /// Wall-clock length of every completed BREAK.
    pub fn break_holds(&self) -> &[Duration] {
        &self.break_holds
    }

    pub fn fail_reads(&mut self, kind: io::ErrorKind) {
        self.read_error = Some(kind);
    }

    pub fn fail_writes(&mut self, kind: io::ErrorKind) {
        self.write_error = Some(kind);
    }
}

impl io::Read for MockLine {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(kind) = self.read_error {
            return Err(io::Error::new(kind, "mock read failure"));
        }
        if self.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no data"));
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl io::Write for MockLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(io::Error::new(kind, "mock write failure"));
        }
        self.written.extend_from_slice(buf);
        if self.echo {
            self.rx.extend(buf.iter().copied());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BusLine for MockLine {
    fn set_break(&mut self) -> io::Result<()> {
        self.break_active = true;
        self.break_count += 1;
        self.break_started = Some(Instant::now());
        Ok(())
    }

    fn clear_break(&mut self) -> io::Result<()> {
        self.break_active = false;
        if let Some(started) = self.break_started.take() {
            self.break_holds.push(started.elapsed());
        }
        Ok(())
    }
}
