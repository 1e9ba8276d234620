use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPlanRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub book_type: String,
    pub category: String,
    pub chapter_count: u32,
    pub author_name: String,
    #[serde(default)]
    pub acknowledgements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterPlan {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPlan {
    pub cover_description: String,
    pub book_description: String,
    pub chapters: Vec<ChapterPlan>,
    pub end_page_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRequest {
    pub title: String,
    pub chapter_title: String,
    pub chapter_summary: String,
    pub chapter_index: i64,
    pub total_chapters: i64,
    pub book_type: String,
    pub book_category: String,
    pub author_name: String,
    /// Keyed by chapter index as sent by the client.
    #[serde(default)]
    pub previous_chapter_summaries: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub content: String,
    pub word_count: usize,
}
