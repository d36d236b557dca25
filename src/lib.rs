//! linguist-language-server
//!
//! Qt Linguist `.ts` catalogs: a reader with message lookup and integrity
//! checks, a Language Server Protocol implementation over them and a batch
//! checker.

pub mod catalog;
pub mod check;
pub mod config;
pub mod db;
pub mod ide;
pub mod indexer;
pub mod input;
pub mod types;

pub use ide::backend::Backend;
