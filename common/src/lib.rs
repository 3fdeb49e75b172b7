pub mod config;
pub mod names;

pub use config::{ClusterConfig, PgBackRestConfig, PitrConfig, SshConfig};
pub use names::NameGenerator;
