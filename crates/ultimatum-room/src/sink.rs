//! Persistence sinks for exchange records

use std::io::Write;

use ultimatum_logic::ExchangeRecord;

use crate::error::RoomError;

/// Append-only destination for [`ExchangeRecord`]s
pub trait RecordSink {
    fn append(&mut self, record: &ExchangeRecord) -> Result<(), RoomError>;
}

/// One JSON object per line on any writer
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn append(&mut self, record: &ExchangeRecord) -> Result<(), RoomError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ExchangeRecord>,
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &ExchangeRecord) -> Result<(), RoomError> {
        self.records.push(record.clone());
        Ok(())
    }
}
