mod client;
mod server;

pub use client::GrpcConnector;

pub(crate) use server::ReplicationServer;
