//! Stack event source adapters.

pub mod aws_cli;
pub mod mock;

pub use aws_cli::{AwsCliConfig, AwsCliStackEventSource};
pub use mock::MockStackEventSource;
