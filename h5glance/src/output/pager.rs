//! Send output to a pager once it outgrows the terminal.

use std::io::{self, IsTerminal, Write};
use std::mem;
use std::process::{Child, Command, Stdio};

use terminal_size::{terminal_size, Height};

use crate::config::Config;

enum State {
    PassThrough,
    Buffering {
        buf: Vec<u8>,
        lines: usize,
        rows: usize,
    },
    Paging(Child),
    Finished,
}

/// A writer that pages long output.
///
/// Output is held back until it has more lines than the terminal has rows.
/// At that point the pager is started, fed everything written so far, and
/// receives the rest directly. Short output is written to the inner writer
/// when the decorator is finished or dropped. When stdout is not a terminal
/// everything passes straight through.
///
/// A pager that exits early (the user quit `less`) is not an error; further
/// output is discarded.
pub struct MaybePagedOutput<W: Write> {
    inner: W,
    pager: Vec<String>,
    state: State,
}

impl<W: Write> MaybePagedOutput<W> {
    /// Wrap `inner`, paging if stdout is a terminal.
    pub fn new(inner: W, config: &Config) -> Self {
        if !io::stdout().is_terminal() {
            return Self::passthrough(inner);
        }
        match terminal_size() {
            Some((_, Height(rows))) => Self::with_terminal(inner, usize::from(rows), config.pager.clone()),
            None => Self::passthrough(inner),
        }
    }

    /// Wrap `inner` as if writing to a terminal with `rows` rows.
    pub fn with_terminal(inner: W, rows: usize, pager: Vec<String>) -> Self {
        Self {
            inner,
            pager,
            state: State::Buffering {
                buf: Vec::new(),
                lines: 0,
                rows,
            },
        }
    }

    /// Wrap `inner` without ever paging.
    pub fn passthrough(inner: W) -> Self {
        Self {
            inner,
            pager: Vec::new(),
            state: State::PassThrough,
        }
    }

    /// Whether output has been handed to a pager.
    #[must_use]
    pub fn is_paging(&self) -> bool {
        matches!(self.state, State::Paging(_))
    }

    fn start_pager(&mut self, buffered: &[u8]) -> io::Result<()> {
        let spawned = match self.pager.split_first() {
            Some((program, args)) => Command::new(program)
                .args(args)
                .stdin(Stdio::piped())
                .spawn(),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no pager configured")),
        };

        match spawned {
            Ok(mut child) => {
                log::debug!("output is longer than the terminal, starting {:?}", self.pager);
                if let Some(stdin) = child.stdin.as_mut() {
                    ignore_broken_pipe(stdin.write_all(buffered))?;
                }
                self.state = State::Paging(child);
            }
            Err(e) => {
                log::warn!("cannot start pager {:?}: {e}", self.pager);
                self.inner.write_all(buffered)?;
                self.state = State::PassThrough;
            }
        }
        Ok(())
    }

    /// Flush held-back output or wait for the pager to exit.
    ///
    /// Called automatically on drop; calling it explicitly surfaces errors.
    ///
    /// # Errors
    ///
    /// Returns any error writing to the inner writer or waiting for the
    /// pager.
    pub fn finish(&mut self) -> io::Result<()> {
        match mem::replace(&mut self.state, State::Finished) {
            State::Buffering { buf, .. } => {
                self.inner.write_all(&buf)?;
                self.inner.flush()
            }
            State::Paging(mut child) => {
                drop(child.stdin.take());
                child.wait()?;
                Ok(())
            }
            State::PassThrough => self.inner.flush(),
            State::Finished => Ok(()),
        }
    }
}

impl<W: Write> Write for MaybePagedOutput<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            State::PassThrough | State::Finished => self.inner.write(data),
            State::Buffering { buf, lines, rows } => {
                buf.extend_from_slice(data);
                *lines += data.iter().filter(|&&b| b == b'\n').count();
                if *lines > *rows {
                    let buffered = mem::take(buf);
                    self.start_pager(&buffered)?;
                }
                Ok(data.len())
            }
            State::Paging(child) => {
                if let Some(stdin) = child.stdin.as_mut() {
                    ignore_broken_pipe(stdin.write_all(data))?;
                }
                Ok(data.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            State::Paging(child) => match child.stdin.as_mut() {
                Some(stdin) => ignore_broken_pipe(stdin.flush()),
                None => Ok(()),
            },
            State::Buffering { .. } => Ok(()),
            State::PassThrough | State::Finished => self.inner.flush(),
        }
    }
}

impl<W: Write> Drop for MaybePagedOutput<W> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::debug!("error finishing output: {e}");
        }
    }
}

fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
