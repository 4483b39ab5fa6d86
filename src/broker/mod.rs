mod admin;
mod apply;
#[allow(clippy::module_inception)]
mod broker;
mod config;
mod dispatch;
mod error;
mod options;
mod replicas;

#[cfg(test)]
mod fixtures;

pub use broker::Broker;
pub use config::BrokerConfig;
pub use error::BrokerError;
pub use options::BrokerOptions;
