use serde_json::{Map, Value, json};

use crate::error::GenerationError;
use crate::models::{BookPlan, BookPlanRequest, ChapterPlan};
use crate::services::llm::TextGenerator;
use crate::utils::json_extract::extract_json;

const REQUIRED_FIELDS: [&str; 4] = [
    "coverDescription",
    "bookDescription",
    "chapters",
    "endPageContent",
];

/// Upper bound on `chapterCount`; placeholder padding allocates per chapter.
pub const MAX_CHAPTERS: usize = 200;

pub async fn generate_plan(
    request: &BookPlanRequest,
    generator: &dyn TextGenerator,
) -> Result<BookPlan, GenerationError> {
    tracing::info!(
        title = %request.title,
        chapter_count = request.chapter_count,
        "Generating book plan"
    );

    ensure_chapter_limit(request.chapter_count as usize)?;

    // Step 1: Ask the model for the plan
    let prompt = build_plan_prompt(request);
    let reply = generator.generate(&prompt).await?;

    // Step 2: Recover the JSON object from the reply
    let value = extract_json(&reply)?;

    // Step 3: Validate and reconcile into the response shape
    plan_from_value(value, request.chapter_count as usize)
}

pub fn build_plan_prompt(request: &BookPlanRequest) -> String {
    let acknowledgements = match &request.acknowledgements {
        Some(text) if !text.is_empty() => format!("Acknowledgements: {}\n", text),
        _ => String::new(),
    };

    format!(
        "You are an expert book planner. Create a detailed plan for a {book_type} book titled \"{title}\" in the {category} category.\n\
         \n\
         The book should have {count} chapters.\n\
         \n\
         Please structure your response as a valid JSON object with the following format:\n\
         {{\"coverDescription\": \"A detailed description for the cover image, specifying visual elements, style, and mood based on the book's theme and genre\",\n\
         \"bookDescription\": \"A compelling 2-3 paragraph description of the book that would appear on the back cover\",\n\
         \"chapters\": [{{\"id\": \"chapter-1\", \"title\": \"Chapter Title\", \"summary\": \"A detailed 1-2 paragraph summary of the chapter content\", \"order\": 1}}, ...],\n\
         \"endPageContent\": \"Content for the end page, including author bio and concluding thoughts\"}}\n\
         \n\
         Additional information:\n\
         Author Name: {author}\n\
         {acknowledgements}\
         \n\
         Make sure chapter titles are creative and appropriate for the {book_type} genre and {category} category.\n\
         Ensure the summaries provide enough detail to guide content generation while maintaining consistency across chapters.\n\
         The cover description should suggest visual elements that would work well for the book's genre and theme.\n\
         \n\
         IMPORTANT: Respond ONLY with the JSON object, no other text.\n",
        book_type = request.book_type,
        title = request.title,
        category = request.category,
        count = request.chapter_count,
        author = request.author_name,
        acknowledgements = acknowledgements,
    )
}

/// Turns the parsed reply into a plan with exactly `requested` chapters.
pub fn plan_from_value(value: Value, requested: usize) -> Result<BookPlan, GenerationError> {
    ensure_chapter_limit(requested)?;

    let Value::Object(mut fields) = value else {
        return Err(GenerationError::NotAnObject);
    };

    for field in REQUIRED_FIELDS {
        if !fields.contains_key(field) {
            return Err(GenerationError::MissingField(field));
        }
    }

    let chapters = match fields.remove("chapters") {
        Some(Value::Array(chapters)) => chapters,
        _ => {
            return Err(GenerationError::InvalidField {
                field: "chapters".to_string(),
                expected: "an array",
            });
        }
    };

    let chapters = reconcile_chapters(chapters, requested)
        .into_iter()
        .enumerate()
        .map(|(idx, chapter)| chapter_from_value(chapter, idx + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BookPlan {
        cover_description: take_string(&mut fields, "coverDescription")?,
        book_description: take_string(&mut fields, "bookDescription")?,
        chapters,
        end_page_content: take_string(&mut fields, "endPageContent")?,
    })
}

fn ensure_chapter_limit(requested: usize) -> Result<(), GenerationError> {
    if requested > MAX_CHAPTERS {
        return Err(GenerationError::TooManyChapters {
            requested,
            max: MAX_CHAPTERS,
        });
    }
    Ok(())
}

/// Truncates or pads `chapters` to `requested` entries.
pub fn reconcile_chapters(mut chapters: Vec<Value>, requested: usize) -> Vec<Value> {
    let parsed = chapters.len();
    if parsed == requested {
        return chapters;
    }

    tracing::warn!(parsed, requested, "Model returned the wrong number of chapters");

    if parsed > requested {
        chapters.truncate(requested);
    } else {
        chapters.extend((parsed + 1..=requested).map(placeholder_chapter));
    }
    chapters
}

fn placeholder_chapter(order: usize) -> Value {
    json!({
        "id": format!("chapter-{}", order),
        "title": format!("Chapter {}", order),
        "summary": format!("Additional chapter content for Chapter {}.", order),
        "order": order,
    })
}

fn chapter_from_value(value: Value, position: usize) -> Result<ChapterPlan, GenerationError> {
    let Value::Object(mut fields) = value else {
        return Err(GenerationError::InvalidField {
            field: format!("chapters[{}]", position - 1),
            expected: "an object",
        });
    };

    let id = match fields.remove("id") {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::Null) | None => format!("chapter-{}", position),
        Some(_) => {
            return Err(GenerationError::InvalidField {
                field: format!("chapters[{}].id", position - 1),
                expected: "a string",
            });
        }
    };

    let order = match fields.remove("order") {
        Some(Value::Null) | None => position as i64,
        Some(order) => integer_value(&order).ok_or_else(|| GenerationError::InvalidField {
            field: format!("chapters[{}].order", position - 1),
            expected: "an integer",
        })?,
    };

    let title = take_chapter_string(&mut fields, "title", position)?;
    let summary = take_chapter_string(&mut fields, "summary", position)?;

    Ok(ChapterPlan {
        id,
        title,
        summary,
        order,
    })
}

/// Reads integers, integral floats such as `2.0`, and numeric strings such as `"2"`.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => match serde_json::from_str(text.trim()).ok()? {
            number @ Value::Number(_) => integer_value(&number),
            _ => None,
        },
        _ => None,
    }
}

fn take_string(fields: &mut Map<String, Value>, field: &'static str) -> Result<String, GenerationError> {
    match fields.remove(field) {
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(GenerationError::InvalidField {
            field: field.to_string(),
            expected: "a string",
        }),
        None => Err(GenerationError::MissingField(field)),
    }
}

fn take_chapter_string(
    fields: &mut Map<String, Value>,
    field: &str,
    position: usize,
) -> Result<String, GenerationError> {
    match fields.remove(field) {
        Some(Value::String(text)) => Ok(text),
        _ => Err(GenerationError::InvalidField {
            field: format!("chapters[{}].{}", position - 1, field),
            expected: "a string",
        }),
    }
}
