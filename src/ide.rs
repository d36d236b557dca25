//! Editor features over the catalog index.

pub mod backend;
pub mod code_actions;
pub mod diagnostics;
pub mod goto_definition;
mod handlers;
pub mod hover;
pub mod references;
pub mod state;
