//! mdc-cookies CLI: batch cookie tester and interactive initializer.
//!
//! Wires the `mdc-cookies` core to a reqwest probe client, the on-disk
//! config file, and a line-editing terminal.

pub mod cli;
pub mod config;
pub mod console;
pub mod http;
