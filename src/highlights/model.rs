use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page-anchored annotation: a comment, optionally tied to a rectangle
/// on the page and the text it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: String,
    /// 1-based page number.
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Excerpt the highlight covers; may be empty.
    #[serde(default)]
    pub content: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A rectangle in PDF point space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Highlight {
    pub fn new(page: usize, comment: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            page,
            region: None,
            content: String::new(),
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}
