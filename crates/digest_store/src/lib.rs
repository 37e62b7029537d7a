//! # Digest Store
//!
//! Storage for rendered summary documents.
//!
//! Documents live in a single output directory and are addressed by a
//! sanitized name derived from the source video URL. Retrieval by name is
//! confined to that directory: any requested name that resolves elsewhere is
//! rejected before the file is opened.

mod domain;
mod store;

pub use domain::{DocumentName, DOCUMENT_EXTENSION, DOCUMENT_PREFIX, FALLBACK_STEM, MAX_STEM_LEN};
pub use store::{FetchError, FsDocumentStore, StoredDocument};
