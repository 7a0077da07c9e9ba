//! Day One journal import
//!
//! Converts Day One JSON exports into Markdown notes with YAML front matter
//! and copies the referenced media into a document store.

pub mod config;
pub mod dayone;
pub mod store;
