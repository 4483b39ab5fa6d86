use crate::commitlog::{Log, Offset, Record};
use bytes::Bytes;
use std::io;

/// InMemoryLog keeps every record in memory. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryLog {
    records: Vec<Record>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        InMemoryLog::default()
    }
}

impl Log for InMemoryLog {
    fn append(&mut self, value: Bytes, timestamp_ms: i64) -> io::Result<Offset> {
        let offset = self.next_offset();
        self.records.push(Record {
            offset,
            timestamp_ms,
            value,
        });

        Ok(offset)
    }

    fn read(&self, from: Offset, max_records: usize) -> io::Result<Vec<Record>> {
        Ok(read_slice(&self.records, from, max_records))
    }

    fn next_offset(&self) -> Offset {
        Offset(self.records.len() as u64)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records are stored densely, so a record's offset is its position in the vector.
pub(super) fn read_slice(records: &[Record], from: Offset, max_records: usize) -> Vec<Record> {
    let start = from.as_u64() as usize;
    if start >= records.len() {
        return Vec::new();
    }
    let end = std::cmp::min(records.len(), start.saturating_add(max_records));

    records[start..end].to_vec()
}
