//! Subcommands of the `pomdrive` binary

pub mod grid;
pub mod init_config;
pub mod run;
pub mod summarize;
