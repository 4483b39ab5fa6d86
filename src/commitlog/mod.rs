mod factory;
mod in_memory;
mod log;
mod storage;

pub use factory::FileLogFactory;
pub use factory::InMemoryLogFactory;
pub use factory::LogFactory;
pub use in_memory::InMemoryLog;
pub use log::Log;
pub use log::Offset;
pub use log::Record;
pub use storage::FileLog;
