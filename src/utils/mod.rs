//! Generic utility primitives with zero domain knowledge.
//!
//! - `checksum` - File digests for copy verification
//! - `command` - Command execution with error handling

pub mod checksum;
pub mod command;
