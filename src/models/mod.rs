pub mod document;
pub mod search;
pub mod talk;

pub use document::{DocId, Document, Field, FieldOptions, StoredDocument, StoredField};
pub use search::{ScoreDoc, TalkResult, TopDocs};
pub use talk::{fields, parse_index_date, Talk, INDEX_DATE_FORMAT};
