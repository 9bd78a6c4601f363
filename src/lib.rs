// ImpLog - lib.rs
//
// Library entry point, exposing the interpreter, the stream gate and its
// collaborators for the CLI binary and for integration testing.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
