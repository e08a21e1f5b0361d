//! Streaming CSV export
//!
//! A provider writes CSV records into a [`CsvSink`]; the HTTP handler drains the
//! other end of the bounded channel into the response body. Memory stays bounded by
//! the channel capacity times the flush threshold, whatever the table size.

use axum::body::Bytes;
use futures::stream::{self, Stream};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::database::codec::{value_to_csv_field, write_csv_record};
use crate::database::traits::DatabaseError;

/// One piece of the CSV body, or the error that ends it
pub type ExportChunk = Result<Bytes, DatabaseError>;

/// Buffered CSV text is sent once it grows past this many bytes
const FLUSH_THRESHOLD: usize = 8 * 1024;

/// Writer half of an export
///
/// Sending blocks while the channel is full, so a slow client slows the database
/// cursor instead of growing a buffer. When the receiver is dropped (the client went
/// away) every write fails with [`DatabaseError::ExportClosed`].
pub struct CsvSink {
    sender: mpsc::Sender<ExportChunk>,
    buffer: String,
    records: u64,
}

impl CsvSink {
    /// Create a sink and the receiver feeding the response body
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ExportChunk>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let sink = Self {
            sender,
            buffer: String::new(),
            records: 0,
        };
        (sink, receiver)
    }

    /// Write the header record and send it immediately
    pub async fn write_header<I, S>(&mut self, columns: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        write_csv_record(&mut self.buffer, columns);
        self.flush().await
    }

    /// Write one data record from decoded column values
    pub async fn write_row<'a, I>(&mut self, values: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        write_csv_record(&mut self.buffer, values.into_iter().map(value_to_csv_field));
        self.records += 1;

        if self.buffer.len() >= FLUSH_THRESHOLD {
            self.flush().await?;
        }
        Ok(())
    }

    /// Send whatever is buffered
    pub async fn flush(&mut self) -> Result<(), DatabaseError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let chunk = Bytes::from(std::mem::take(&mut self.buffer));
        self.sender
            .send(Ok(chunk))
            .await
            .map_err(|_| DatabaseError::ExportClosed)
    }

    /// Number of data records written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush buffered records, then pass a failure on to the body so it ends early
    ///
    /// Returns the number of data records written.
    pub async fn finish(mut self, result: Result<(), DatabaseError>) -> u64 {
        let flushed = self.flush().await;

        match result {
            Ok(()) | Err(DatabaseError::ExportClosed) => {}
            Err(error) => {
                if flushed.is_ok() {
                    let _ = self.sender.send(Err(error)).await;
                }
            }
        }

        self.records
    }
}

/// Turn the receiver into a body stream
pub fn body_stream(receiver: mpsc::Receiver<ExportChunk>) -> impl Stream<Item = ExportChunk> {
    stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|chunk| (chunk, receiver))
    })
}
