//! Subcommand implementations for the `mdc-cookies` binary.

pub mod init_cmd;
pub mod output;
pub mod targets_cmd;
pub mod test_cmd;
