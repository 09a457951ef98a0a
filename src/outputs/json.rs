//! JSON feed writers.
//!
//! [`JsonLinesSink`] streams one object per line as records arrive, so a crawl
//! interrupted halfway still leaves a usable file. [`JsonArraySink`] buffers
//! the whole crawl and writes a single array when it finishes.

use super::RecordSink;
use crate::models::ArticleRecord;
use clap::ValueEnum;
use std::error::Error;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{info, instrument};

/// Feed format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
    /// A single pretty-printed JSON array.
    Json,
}

type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

pub struct JsonLinesSink<W> {
    writer: BufWriter<W>,
    written: usize,
}

impl<W: AsyncWrite + Unpin> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: AsyncWrite + Unpin> RecordSink for JsonLinesSink<W> {
    async fn emit(&mut self, record: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Box<dyn Error>> {
        self.writer.flush().await?;
        info!(records = self.written, "Flushed JSON Lines feed");
        Ok(())
    }
}

pub struct JsonArraySink<W> {
    writer: W,
    records: Vec<ArticleRecord>,
}

impl<W: AsyncWrite + Unpin> JsonArraySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin> RecordSink for JsonArraySink<W> {
    async fn emit(&mut self, record: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        self.records.push(record.clone());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), Box<dyn Error>> {
        let mut json = serde_json::to_vec_pretty(&self.records)?;
        json.push(b'\n');
        self.writer.write_all(&json).await?;
        self.writer.flush().await?;
        info!(records = self.records.len(), "Wrote JSON feed");
        Ok(())
    }
}

/// The sink chosen at startup.
pub enum FeedSink {
    Lines(JsonLinesSink<BoxedWriter>),
    Array(JsonArraySink<BoxedWriter>),
}

impl FeedSink {
    /// Open a feed at `path`, or on stdout when no path is given.
    ///
    /// Parent directories of `path` are created as needed.
    #[instrument(level = "info", skip_all, fields(?format, path = ?path))]
    pub async fn open(format: OutputFormat, path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let writer: BoxedWriter = match path {
            Some(path) => {
                crate::utils::ensure_parent_dir(path).await?;
                info!(%path, "Writing feed to file");
                Box::new(fs::File::create(path).await?)
            }
            None => Box::new(tokio::io::stdout()),
        };
        Ok(match format {
            OutputFormat::Jsonl => FeedSink::Lines(JsonLinesSink::new(writer)),
            OutputFormat::Json => FeedSink::Array(JsonArraySink::new(writer)),
        })
    }
}

impl RecordSink for FeedSink {
    async fn emit(&mut self, record: &ArticleRecord) -> Result<(), Box<dyn Error>> {
        match self {
            FeedSink::Lines(sink) => sink.emit(record).await,
            FeedSink::Array(sink) => sink.emit(record).await,
        }
    }

    async fn finish(&mut self) -> Result<(), Box<dyn Error>> {
        match self {
            FeedSink::Lines(sink) => sink.finish().await,
            FeedSink::Array(sink) => sink.finish().await,
        }
    }
}
