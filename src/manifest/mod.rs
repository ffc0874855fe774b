//! Manifest loading: multi-document YAML sources into structured documents.

pub mod document;
pub mod parse;
pub(crate) mod strict;

pub use document::{Document, DocumentId};
pub use parse::{LoadedFile, flatten, load_documents};
