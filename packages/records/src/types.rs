// ABOUTME: Record, header, and collection type definitions
// ABOUTME: Records are HTTP request definitions ordered for display within collections

use chrono::{DateTime, Utc};
use courier_core::generate_id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub id: String,
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: generate_id("hdr"),
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub collection_id: String,
    pub name: String,
    pub method: String,
    pub url: Option<String>,
    pub body: Option<String>,
    /// Display position. Global across collections, not necessarily contiguous.
    pub order: i64,
    /// `None` when the record was loaded without its headers
    pub headers: Option<Vec<Header>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// A new, unsaved `GET` record. Its order is assigned on create.
    pub fn new(collection_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id("rec"),
            collection_id: collection_id.into(),
            name: name.into(),
            method: "GET".to_string(),
            url: None,
            body: None,
            order: 0,
            headers: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push(Header::new(key, value));
        self
    }

    /// Headers as a slice, empty when not loaded
    pub fn header_list(&self) -> &[Header] {
        self.headers.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCreateInput {
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = Record::new("col-1", "List users");

        assert!(record.id.starts_with("rec-"));
        assert_eq!(record.collection_id, "col-1");
        assert_eq!(record.method, "GET");
        assert_eq!(record.order, 0);
        assert!(record.headers.is_none());
        assert!(record.header_list().is_empty());
    }

    #[test]
    fn test_with_header_accumulates() {
        let record = Record::new("col-1", "Create user")
            .with_method("POST")
            .with_header("Accept", "application/json")
            .with_header("X-Trace", "1");

        let keys: Vec<&str> = record.header_list().iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["Accept", "X-Trace"]);
        assert_ne!(record.header_list()[0].id, record.header_list()[1].id);
    }
}
