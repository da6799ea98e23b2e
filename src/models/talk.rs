use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::document::{Document, FieldOptions, StoredDocument};
use crate::error::{Result, TalkdexError};

/// Field names of an indexed talk
pub mod fields {
    pub const PATH: &str = "path";
    pub const TITLE: &str = "title";
    pub const SPEAKER: &str = "speaker";
    pub const DATE: &str = "date";
    pub const CONTENT: &str = "content";
    pub const CATEGORY: &str = "category";
}

/// Sortable fixed-width date form used in the index
pub const INDEX_DATE_FORMAT: &str = "%Y%m%d";

/// A conference talk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talk {
    /// Where the talk was loaded from
    pub path: String,
    pub title: String,
    pub authors: Vec<String>,
    pub date: NaiveDate,
    pub content: String,
    pub categories: Vec<String>,
}

impl Talk {
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        authors: Vec<String>,
        date: NaiveDate,
        content: impl Into<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            authors,
            date,
            content: content.into(),
            categories,
        }
    }

    /// Map the talk to an indexable document
    pub fn to_document(&self) -> Document {
        let opts = FieldOptions::STORED_INDEXED;
        let mut doc = Document::new()
            .with(fields::PATH, self.path.as_str(), opts)
            .with(fields::TITLE, self.title.as_str(), opts);
        for author in &self.authors {
            doc.add(fields::SPEAKER, author.as_str(), opts);
        }
        doc.add(
            fields::DATE,
            self.date.format(INDEX_DATE_FORMAT).to_string(),
            opts,
        );
        doc.add(fields::CONTENT, self.content.as_str(), opts);
        for category in &self.categories {
            doc.add(fields::CATEGORY, category.as_str(), opts);
        }
        doc
    }

    /// Rebuild a talk from its stored fields
    pub fn from_stored(doc: &StoredDocument) -> Result<Self> {
        let title = doc.get(fields::TITLE).ok_or_else(|| {
            TalkdexError::InvalidDocument(format!("document {} has no title", doc.id))
        })?;
        let date = doc
            .get(fields::DATE)
            .and_then(parse_index_date)
            .ok_or_else(|| {
                TalkdexError::InvalidDocument(format!("document {} has no valid date", doc.id))
            })?;

        Ok(Self {
            path: doc.get(fields::PATH).unwrap_or_default().to_string(),
            title: title.to_string(),
            authors: owned(doc.get_all(fields::SPEAKER)),
            date,
            content: doc.get(fields::CONTENT).unwrap_or_default().to_string(),
            categories: owned(doc.get_all(fields::CATEGORY)),
        })
    }
}

/// Parse a `YYYYMMDD` date as written by [`Talk::to_document`]
pub fn parse_index_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, INDEX_DATE_FORMAT).ok()
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocId;

    fn karaf() -> Talk {
        Talk::new(
            "/talks/karaf.properties",
            "Apache Karaf",
            vec!["Achim Nierbeck".to_string(), "Christian Schneider".to_string()],
            NaiveDate::from_ymd_opt(2012, 4, 4).unwrap(),
            "Karaf ist ein OSGi Container",
            vec!["Java".to_string(), "OSGi".to_string()],
        )
    }

    #[test]
    fn test_to_document_fields() {
        let doc = karaf().to_document();
        assert_eq!(doc.get(fields::TITLE), Some("Apache Karaf"));
        assert_eq!(doc.get(fields::DATE), Some("20120404"));
        assert_eq!(
            doc.get_all(fields::SPEAKER),
            vec!["Achim Nierbeck", "Christian Schneider"]
        );
        assert_eq!(doc.get_all(fields::CATEGORY), vec!["Java", "OSGi"]);
        assert!(doc.fields().iter().all(|f| f.is_stored() && f.is_indexed()));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_stored_round_trip() {
        let talk = karaf();
        let stored = StoredDocument::from_document(DocId(0), &talk.to_document());
        assert_eq!(Talk::from_stored(&stored).unwrap(), talk);
    }

    #[test]
    fn test_from_stored_requires_title() {
        let doc = Document::new().with(fields::DATE, "20120404", FieldOptions::STORED_INDEXED);
        let stored = StoredDocument::from_document(DocId(1), &doc);
        assert!(Talk::from_stored(&stored).is_err());
    }

    #[test]
    fn test_parse_index_date() {
        assert_eq!(
            parse_index_date("20120612"),
            NaiveDate::from_ymd_opt(2012, 6, 12)
        );
        assert_eq!(parse_index_date("12.06.2012"), None);
    }
}
