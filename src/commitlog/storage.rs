use crate::commitlog::in_memory::read_slice;
use crate::commitlog::{Log, Offset, Record};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

// Based on https://thehoard.blog/how-kafkas-storage-internals-work-3a29b02e026, minus crc,
// version and attributes.
//
// Bytes:
// 0..8    : offset
// 8..16   : timestamp (ms)
// 16..20  : value size
// 20..    : value
const HEADER_LEN: usize = 8 + 8 + 4;

const SEGMENT_FILE_NAME: &str = "00000000000000000000.log";

/// FileLog is a single-segment log file. Records are also kept in memory, so reads never touch
/// the disk; the file is only read once, when the log is opened.
pub struct FileLog {
    path: PathBuf,
    file: File,
    records: Vec<Record>,
    // Bytes of intact records in the segment.
    len: u64,
}

impl FileLog {
    /// Opens the log in `directory`, creating both if needed. A torn record at the end of the
    /// segment (e.g. from a crash mid-write) is cut off.
    pub fn open(directory: &Path) -> io::Result<Self> {
        fs::create_dir_all(directory)?;
        let path = directory.join(SEGMENT_FILE_NAME);
        let mut file = OpenOptions::new().create(true).read(true).append(true).open(&path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let (records, valid_len) = decode_segment(&contents);
        if valid_len < contents.len() {
            file.set_len(valid_len as u64)?;
        }

        Ok(FileLog {
            path,
            file,
            records,
            len: valid_len as u64,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cut_torn_tail(&self) -> io::Result<()> {
        if self.file.metadata()?.len() != self.len {
            self.file.set_len(self.len)?;
        }
        Ok(())
    }
}

impl Log for FileLog {
    fn append(&mut self, value: Bytes, timestamp_ms: i64) -> io::Result<Offset> {
        let offset = self.next_offset();

        let mut buf = BytesMut::with_capacity(HEADER_LEN + value.len());
        buf.put_u64(offset.as_u64());
        buf.put_i64(timestamp_ms);
        buf.put_u32(value.len() as u32);
        buf.put_slice(&value);
        self.cut_torn_tail()?;
        if let Err(e) = self.file.write_all(&buf) {
            // Whatever part of the record made it out is cut off here, or by the next append if
            // this fails too.
            let _ = self.file.set_len(self.len);
            return Err(e);
        }
        self.len += buf.len() as u64;

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
        self.file.sync_data()
    }
}

/// Returns every intact record and the number of bytes they occupy.
fn decode_segment(contents: &[u8]) -> (Vec<Record>, usize) {
    let mut records = Vec::new();
    let mut consumed = 0;

    loop {
        let remaining = &contents[consumed..];
        if remaining.len() < HEADER_LEN {
            break;
        }
        let mut header = &remaining[..HEADER_LEN];
        let offset = header.get_u64();
        let timestamp_ms = header.get_i64();
        let value_len = header.get_u32() as usize;
        if remaining.len() < HEADER_LEN + value_len || offset != records.len() as u64 {
            break;
        }

        records.push(Record {
            offset: Offset(offset),
            timestamp_ms,
            value: Bytes::copy_from_slice(&remaining[HEADER_LEN..HEADER_LEN + value_len]),
        });
        consumed += HEADER_LEN + value_len;
    }

    (records, consumed)
}
