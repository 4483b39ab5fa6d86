use crate::commitlog::{FileLog, InMemoryLog, Log};
use std::io;
use std::path::Path;

/// LogFactory opens the log of one partition replica inside its directory.
pub trait LogFactory: Send + Sync {
    fn open(&self, directory: &Path) -> io::Result<Box<dyn Log>>;
}

pub struct InMemoryLogFactory;

impl LogFactory for InMemoryLogFactory {
    fn open(&self, _: &Path) -> io::Result<Box<dyn Log>> {
        Ok(Box::new(InMemoryLog::new()))
    }
}

pub struct FileLogFactory;

impl LogFactory for FileLogFactory {
    fn open(&self, directory: &Path) -> io::Result<Box<dyn Log>> {
        let log = FileLog::open(directory)?;
        Ok(Box::new(log))
    }
}
