// ImpLog - app/mod.rs
//
// Application layer: the stream gate, its collaborators, and the pump that
// serialises access to it.
// Dependencies: core layer.

pub mod collaborators;
pub mod console;
pub mod diagnostics;
pub mod gate;
pub mod pump;
pub mod session;
