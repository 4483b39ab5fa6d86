use bytes::Bytes;
use std::{fmt, io};

/// Offset is the position of a record in a partition log. The first record is written at 0.
#[derive(Copy, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct Offset(pub u64);

impl Offset {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub offset: Offset,
    pub timestamp_ms: i64,
    pub value: Bytes,
}

/// Log is the append only log holding one partition replica's records.
pub trait Log: Send {
    /// append() appends a record at the log end, then returns the offset that was just used.
    fn append(&mut self, value: Bytes, timestamp_ms: i64) -> io::Result<Offset>;

    /// Reads at most `max_records` records starting at `from`. Reading at or past the log end
    /// returns nothing.
    fn read(&self, from: Offset, max_records: usize) -> io::Result<Vec<Record>>;

    /// next_offset returns the offset that the next append will use, i.e. the log end offset.
    fn next_offset(&self) -> Offset;

    fn flush(&mut self) -> io::Result<()>;
}
