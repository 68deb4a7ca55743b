// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented draining of a subprocess output stream.
//!
//! A collector reads one stream until end-of-stream or a read error, turning
//! it into an ordered sequence of lines. Each line is optionally echoed to the
//! console and published to a live subscriber channel as it arrives.

use std::fmt;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::env;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Which subprocess output stream a collector is draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Destination for collected lines.
pub trait LineSink {
    fn push_line(&mut self, line: String);
}

impl LineSink for Vec<String> {
    fn push_line(&mut self, line: String) {
        self.push(line);
    }
}

/// Result of draining one stream: everything collected, plus the read error
/// that ended collection early, if any.
#[derive(Debug)]
pub struct Collected<S> {
    pub lines: S,
    pub error: Option<io::Error>,
}

/// Drains one byte stream into lines.
#[derive(Debug, Clone)]
pub struct OutputCollector {
    stream: StreamKind,
    echo: bool,
    live: Option<mpsc::Sender<String>>,
    max_line_bytes: usize,
}

impl OutputCollector {
    pub fn new(stream: StreamKind) -> Self {
        Self {
            stream,
            echo: false,
            live: None,
            max_line_bytes: env::max_line_bytes(),
        }
    }

    /// Write every line to the console as it arrives.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Publish every line to `tx`. Publishing waits for channel capacity, so
    /// a subscriber that never reads stalls collection.
    pub fn live(mut self, tx: Option<mpsc::Sender<String>>) -> Self {
        self.live = tx;
        self
    }

    pub fn max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max;
        self
    }

    /// Collect into a fresh `Vec`.
    pub async fn collect_vec<R>(&self, reader: R) -> Collected<Vec<String>>
    where
        R: AsyncRead + Unpin,
    {
        self.collect(reader, Vec::new()).await
    }

    /// Drain `reader` into `sink` until end-of-stream or a read error.
    ///
    /// Lines already pushed to the sink are kept when a read error occurs.
    pub async fn collect<R, S>(&self, reader: R, mut sink: S) -> Collected<S>
    where
        R: AsyncRead + Unpin,
        S: LineSink,
    {
        let mut reader = BufReader::with_capacity(READ_BUFFER_BYTES, reader);
        let mut buf = Vec::new();
        let mut live = self.live.clone();

        let read_error = loop {
            let line = match next_line(&mut reader, &mut buf, self.max_line_bytes).await {
                Ok(Some(line)) => line,
                Ok(None) => break None,
                Err(e) => {
                    tracing::debug!(
                        stream = %self.stream,
                        error = %e,
                        "output collection ended with read error"
                    );
                    break Some(e);
                }
            };

            if self.echo {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{line}");
            }

            match live.as_ref() {
                Some(tx) => {
                    sink.push_line(line.clone());
                    if tx.send(line).await.is_err() {
                        tracing::debug!(stream = %self.stream, "live output receiver dropped");
                        live = None;
                    }
                }
                None => sink.push_line(line),
            }
        };

        Collected {
            lines: sink,
            error: read_error,
        }
    }
}

/// Read the next line from `reader`, without its terminator.
///
/// Returns `Ok(None)` at end-of-stream. A final line without a trailing
/// newline is still returned. A trailing `\r` is dropped.
async fn next_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let (done, used) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                if buf.is_empty() {
                    return Ok(None);
                }
                break;
            }
            let (chunk, done) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (&available[..i], true),
                None => (available, false),
            };
            if buf.len() + chunk.len() > max {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line exceeds {max} bytes"),
                ));
            }
            buf.extend_from_slice(chunk);
            (done, if done { chunk.len() + 1 } else { chunk.len() })
        };
        reader.consume(used);
        if done {
            break;
        }
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
