use serde::{Deserialize, Serialize};

/// One captured web-page snapshot.
///
/// `file_path` and `thumb_path` are relative to the data root in forward-slash
/// form; an empty string means the file is absent. `deleted_at == 0` marks an
/// active record, anything else is the soft-delete timestamp (ms epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub title: String,
    pub alias: String,
    pub favicon: String,
    pub file_path: String,
    pub thumb_path: String,
    pub file_size: i64,
    pub created_at: i64,
    pub deleted_at: i64,
    pub notes: String,
    pub tags: Vec<String>,
    pub bookmark_id: String,
}

impl Bookmark {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at > 0
    }

    /// Alias if set, then title, then id.
    pub fn display_name(&self) -> &str {
        if !self.alias.trim().is_empty() {
            &self.alias
        } else if !self.title.trim().is_empty() {
            &self.title
        } else {
            &self.id
        }
    }
}

/// Payload submitted by the capturing client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveInput {
    pub url: String,
    pub title: String,
    pub favicon: String,
    pub html: String,
    /// Inline `data:image/...;base64,` URI.
    pub screenshot: String,
    #[serde(alias = "bookmarkId")]
    pub bookmark_id: String,
}

/// Row filter for active-record listings. URL match wins over text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    UrlExact(String),
    Text(String),
}

impl ListFilter {
    /// Builds a filter from optional query parameters, ignoring blank values.
    pub fn from_params(query: Option<&str>, url: Option<&str>) -> Self {
        match (url.filter(|u| !u.is_empty()), query.filter(|q| !q.is_empty())) {
            (Some(u), _) => ListFilter::UrlExact(u.to_string()),
            (None, Some(q)) => ListFilter::Text(q.to_string()),
            (None, None) => ListFilter::All,
        }
    }
}

/// A window of results plus the total matching count.
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkPage {
    pub items: Vec<Bookmark>,
    pub total: i64,
}

/// Aggregate counters over the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub active_count: i64,
    pub total_bytes: i64,
    pub trash_count: i64,
}

/// One item that a batch operation could not finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub cause: String,
}

/// Outcome of a batch operation that never aborts on a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn record_failure(&mut self, id: &str, cause: impl Into<String>) {
        self.failed.push(BatchFailure {
            id: id.to_string(),
            cause: cause.into(),
        });
    }
}
