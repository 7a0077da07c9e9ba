//! Day One import module
//!
//! Handles importing Day One JSON exports into a document store.
//! Supports:
//! - One Markdown note per entry with YAML front matter
//! - Rich text bodies with plain text fallback
//! - Photos, audio and video copied into an `attachments/` folder
//! - ZIP export archives and loose export folders as media sources
//! - A `Failed Imports` note listing entries that could not be converted

mod archive;
mod errors;
mod import;
mod media;
mod schema;
mod transform;

pub use archive::*;
pub use errors::*;
pub use import::*;
pub use media::*;
pub use schema::*;
pub use transform::*;
