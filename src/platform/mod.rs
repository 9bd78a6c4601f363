// ImpLog - platform/mod.rs
//
// Platform abstraction layer: config files, directories, filesystem access.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
