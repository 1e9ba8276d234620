use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::models::{ChapterRequest, ChapterResponse};
use crate::services::llm::TextGenerator;

pub async fn generate_chapter(
    request: &ChapterRequest,
    generator: &dyn TextGenerator,
) -> Result<ChapterResponse, GenerationError> {
    tracing::info!(
        title = %request.title,
        chapter_index = request.chapter_index,
        total_chapters = request.total_chapters,
        "Generating chapter content"
    );

    let prompt = build_chapter_prompt(request);
    let content = generator.generate(&prompt).await?;
    let word_count = count_words(&content);

    tracing::info!(word_count, "Chapter generated");

    Ok(ChapterResponse {
        content,
        word_count,
    })
}

pub fn count_words(content: &str) -> usize {
    content.split_whitespace().count()
}

pub fn build_chapter_prompt(request: &ChapterRequest) -> String {
    let previous = request
        .previous_chapter_summaries
        .as_ref()
        .filter(|summaries| !summaries.is_empty())
        .map(|summaries| format!("Previous chapters include: {}\n", join_summaries(summaries)))
        .unwrap_or_default();

    format!(
        "You are an expert book author writing a {book_type} book titled \"{title}\" in the {category} category.\n\
         \n\
         Your task is to write chapter {index} out of {total}, titled \"{chapter_title}\".\n\
         \n\
         Here's the summary that you should follow for this chapter:\n\
         {summary}\n\
         \n\
         {previous}\
         \n\
         Write a compelling, engaging, and high-quality chapter that is appropriate for the {book_type} genre and {category} category.\n\
         The content should be detailed, creative, and well-structured with proper paragraphs.\n\
         \n\
         For fiction, include dialogue, description, and character development.\n\
         For non-fiction, include clear explanations, examples, and evidence.\n\
         For children's books, use simple language, vivid descriptions, and moral lessons.\n\
         For poetry, focus on rhythm, imagery, and emotional resonance.\n\
         \n\
         IMPORTANT: Respond ONLY with the chapter content, no other text.\n",
        book_type = request.book_type,
        title = request.title,
        category = request.book_category,
        index = request.chapter_index,
        total = request.total_chapters,
        chapter_title = request.chapter_title,
        summary = request.chapter_summary,
        previous = previous,
    )
}

/// Joins summaries as `Chapter {key}: {summary}`, numeric keys first in
/// numeric order, the rest lexically.
fn join_summaries(summaries: &BTreeMap<String, String>) -> String {
    let mut entries: Vec<(&String, &String)> = summaries.iter().collect();
    entries.sort_by(|(a, _), (b, _)| {
        match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        }
    });

    entries
        .iter()
        .map(|(key, summary)| format!("Chapter {}: {}", key, summary))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::CannedGenerator;

    fn request() -> ChapterRequest {
        ChapterRequest {
            title: "The Lighthouse Keeper".to_string(),
            chapter_title: "The Bottle".to_string(),
            chapter_summary: "Ada finds a message washed ashore.".to_string(),
            chapter_index: 3,
            total_chapters: 10,
            book_type: "Fiction".to_string(),
            book_category: "Mystery".to_string(),
            author_name: "Ada Quill".to_string(),
            previous_chapter_summaries: None,
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("Hello world"), 2);
        assert_eq!(count_words("  spaced\tout\n\nwords  here "), 4);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t"), 0);
    }

    #[tokio::test]
    async fn test_generate_chapter_returns_raw_content() {
        let generator = CannedGenerator::replying("It was a dark and stormy night.\n\nThe lamp flickered.");
        let response = generate_chapter(&request(), &generator).await.unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(response.content, "It was a dark and stormy night.\n\nThe lamp flickered.");
        assert_eq!(response.word_count, 10);
    }

    #[tokio::test]
    async fn test_generate_chapter_propagates_upstream_failure() {
        let generator = CannedGenerator::failing("connection reset");
        let err = generate_chapter(&request(), &generator).await.unwrap_err();
        assert!(matches!(err, GenerationError::Llm(_)));
    }

    #[test]
    fn test_prompt_contains_chapter_details() {
        let prompt = build_chapter_prompt(&request());
        assert!(prompt.contains("writing a Fiction book titled \"The Lighthouse Keeper\" in the Mystery category"));
        assert!(prompt.contains("write chapter 3 out of 10, titled \"The Bottle\""));
        assert!(prompt.contains("Ada finds a message washed ashore."));
        assert!(prompt.contains("For poetry, focus on rhythm"));
        assert!(!prompt.contains("Previous chapters include"));
    }

    #[test]
    fn test_prompt_orders_previous_summaries_numerically() {
        let mut req = request();
        req.previous_chapter_summaries = Some(BTreeMap::from([
            ("10".to_string(), "Tenth".to_string()),
            ("2".to_string(), "Second".to_string()),
            ("1".to_string(), "First".to_string()),
        ]));

        let prompt = build_chapter_prompt(&req);
        assert!(prompt.contains(
            "Previous chapters include: Chapter 1: First, Chapter 2: Second, Chapter 10: Tenth"
        ));
    }

    #[test]
    fn test_empty_previous_summaries_are_omitted() {
        let mut req = request();
        req.previous_chapter_summaries = Some(BTreeMap::new());
        assert!(!build_chapter_prompt(&req).contains("Previous chapters include"));
    }
}
