// src/exec/sink.rs

//! Destination for child output lines.
//!
//! Relays hand finished lines to a [`LineSink`]. The production sink,
//! [`WriterSink`], never touches the output stream from the relay task
//! itself: lines are queued on a bounded channel and a single writer task
//! owns the stream. A slow or stalled stdout reader therefore only ever
//! parks async tasks, never a runtime worker thread.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::Local;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// Timestamp layout used in line prefixes: `YYYY/MM/DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Lines that may be queued ahead of the writer task before relays wait.
pub const SINK_QUEUE_CAPACITY: usize = 1024;

/// Where relayed child output ends up.
///
/// Implementations receive fully formatted lines without a trailing newline
/// and must emit each one whole, never interleaved with another caller's.
pub trait LineSink: Send + Sync + fmt::Debug {
    fn write_line(&self, line: String) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

#[derive(Debug)]
enum SinkMessage {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Channel-fed sink backed by one writer task.
#[derive(Debug, Clone)]
pub struct WriterSink {
    tx: mpsc::Sender<SinkMessage>,
}

impl WriterSink {
    /// Sink writing to the process's standard output.
    ///
    /// Must be called from within a tokio runtime.
    pub fn stdout() -> Self {
        Self::with_writer(tokio::io::stdout())
    }

    pub fn with_writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SINK_QUEUE_CAPACITY);
        tokio::spawn(write_loop(writer, rx));
        Self { tx }
    }

    /// Resolves once every line queued before this call has been written
    /// and the underlying writer flushed.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SinkMessage::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

impl LineSink for WriterSink {
    fn write_line(&self, line: String) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.tx.send(SinkMessage::Line(line)).await.is_err() {
                trace!("output writer gone; dropping line");
            }
        })
    }
}

async fn write_loop<W>(writer: W, mut rx: mpsc::Receiver<SinkMessage>)
where
    W: AsyncWrite + Unpin,
{
    let mut out = BufWriter::new(writer);
    // After the first write error lines are still drained, just discarded,
    // so a closed stdout never backs up into the relays.
    let mut broken = false;

    while let Some(msg) = rx.recv().await {
        match msg {
            SinkMessage::Line(line) => {
                if !broken {
                    if let Err(e) = write_one(&mut out, &line).await {
                        debug!(error = %e, "output write failed; discarding further lines");
                        broken = true;
                    }
                }
            }
            SinkMessage::Flush(ack) => {
                if !broken {
                    if let Err(e) = out.flush().await {
                        debug!(error = %e, "output flush failed; discarding further lines");
                        broken = true;
                    }
                }
                let _ = ack.send(());
                continue;
            }
        }

        // Batch while lines keep coming, flush as soon as the queue drains.
        if rx.is_empty() && !broken {
            if let Err(e) = out.flush().await {
                debug!(error = %e, "output flush failed; discarding further lines");
                broken = true;
            }
        }
    }

    if !broken {
        let _ = out.flush().await;
    }
}

async fn write_one<W>(out: &mut BufWriter<W>, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}

/// Formats raw child lines according to whether the child is prefixed.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    label: String,
    prefixed: bool,
}

impl LineFormatter {
    pub fn new(label: impl Into<String>, prefixed: bool) -> Self {
        Self {
            label: label.into(),
            prefixed,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn format(&self, line: &str) -> String {
        if self.prefixed {
            format!(
                "{} {}: {}",
                Local::now().format(TIMESTAMP_FORMAT),
                self.label,
                line
            )
        } else {
            line.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDateTime;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

    use super::*;

    #[test]
    fn prefixed_line_has_timestamp_and_label() {
        let formatted = LineFormatter::new("worker", true).format("hello");

        let (stamp, rest) = formatted.split_at(19);
        assert_eq!(rest, " worker: hello");
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn unprefixed_line_is_verbatim() {
        let formatter = LineFormatter::new("worker", false);
        assert_eq!(formatter.format("hello"), "hello");
        assert_eq!(formatter.format(""), "");
    }

    #[tokio::test]
    async fn writer_sink_emits_lines_in_order() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let sink = WriterSink::with_writer(writer);

        sink.write_line("one".to_string()).await;
        sink.write_line(String::new()).await;
        sink.write_line("three".to_string()).await;
        sink.flush().await;
        drop(sink);

        let mut text = String::new();
        tokio::time::timeout(Duration::from_secs(5), reader.read_to_string(&mut text))
            .await
            .expect("writer task should close the stream")
            .expect("read succeeds");
        assert_eq!(text, "one\n\nthree\n");
    }

    #[tokio::test]
    async fn stalled_reader_does_not_block_callers() {
        let (writer, reader) = tokio::io::duplex(8);
        let sink = WriterSink::with_writer(writer);

        let queue = async {
            for i in 0..10 {
                sink.write_line(format!("line {i}")).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(1), queue)
            .await
            .expect("lines should queue while nobody reads");

        let mut flush = Box::pin(sink.flush());
        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut flush)
                .await
                .is_err(),
            "flush must wait for the reader"
        );

        let read = async {
            let mut reader = BufReader::new(reader);
            let mut lines = Vec::new();
            for _ in 0..10 {
                let mut line = String::new();
                reader.read_line(&mut line).await.expect("read line");
                lines.push(line);
            }
            lines
        };
        let ((), lines) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(flush, read)
        })
        .await
        .expect("flush completes once the reader catches up");

        assert_eq!(lines.first().map(String::as_str), Some("line 0\n"));
        assert_eq!(lines.last().map(String::as_str), Some("line 9\n"));
    }

    #[tokio::test]
    async fn closed_output_keeps_accepting_lines() {
        let (writer, reader) = tokio::io::duplex(8);
        drop(reader);
        let sink = WriterSink::with_writer(writer);

        let drain = async {
            for i in 0..(SINK_QUEUE_CAPACITY + 10) {
                sink.write_line(format!("line {i}")).await;
            }
            sink.flush().await;
        };
        tokio::time::timeout(Duration::from_secs(5), drain)
            .await
            .expect("a closed stdout must not back up into relays");
    }
}
