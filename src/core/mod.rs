// ImpLog - core/mod.rs
//
// Core business logic layer: classification, grammars, parsing, resolution.
// Must NOT depend on: app, platform, or any I/O.

pub mod classify;
pub mod grammar;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod sourcemap;
