use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TalkdexError};

/// Document identifier, assigned monotonically at commit and never reused
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store/index behaviour of a field, always given explicitly
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptions {
    /// Value is retrievable verbatim from search results
    pub stored: bool,
    /// Value is analyzed and searchable
    pub indexed: bool,
}

impl FieldOptions {
    pub const STORED_INDEXED: FieldOptions = FieldOptions {
        stored: true,
        indexed: true,
    };
    pub const STORED_ONLY: FieldOptions = FieldOptions {
        stored: true,
        indexed: false,
    };
    pub const INDEXED_ONLY: FieldOptions = FieldOptions {
        stored: false,
        indexed: true,
    };
}

/// A named, possibly multi-valued field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub values: Vec<String>,
    pub options: FieldOptions,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: FieldOptions) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
            options,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.options.stored
    }

    pub fn is_indexed(&self) -> bool {
        self.options.indexed
    }
}

/// A document under construction, handed to the index store
///
/// Values added under an existing field name with the same options are
/// appended to that field, keeping insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field value (builder style)
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: FieldOptions,
    ) -> Self {
        self.add(name, value, options);
        self
    }

    /// Add a field value
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>, options: FieldOptions) {
        let name = name.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|f| f.name == name && f.options == options)
        {
            Some(field) => field.values.push(value),
            None => self.fields.push(Field {
                name,
                values: vec![value],
                options,
            }),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).into_iter().next()
    }

    /// All values of a field in insertion order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .flat_map(|f| f.values.iter().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject structurally invalid documents
    pub fn validate(&self) -> Result<()> {
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(TalkdexError::InvalidDocument(
                    "field name must not be empty".to_string(),
                ));
            }
            if !field.options.stored && !field.options.indexed {
                return Err(TalkdexError::InvalidDocument(format!(
                    "field '{}' is neither stored nor indexed",
                    field.name
                )));
            }
        }
        Ok(())
    }
}

/// A stored field as returned from a committed document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredField {
    pub name: String,
    pub values: Vec<String>,
}

/// The stored fields of a committed document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocId,
    pub fields: Vec<StoredField>,
}

impl StoredDocument {
    pub(crate) fn from_document(id: DocId, doc: &Document) -> Self {
        let fields = doc
            .fields()
            .iter()
            .filter(|f| f.is_stored())
            .map(|f| StoredField {
                name: f.name.clone(),
                values: f.values.clone(),
            })
            .collect();
        Self { id, fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).into_iter().next()
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .flat_map(|f| f.values.iter().map(String::as_str))
            .collect()
    }
}
