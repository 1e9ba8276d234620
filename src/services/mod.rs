pub mod book_planner;
pub mod chapter_writer;
pub mod llm;

#[cfg(test)]
pub mod testing {
    use super::llm::{LlmError, TextGenerator};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed result and remembers every prompt it was given.
    pub struct CannedGenerator {
        reply: Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        pub fn replying(reply: impl Into<String>) -> Self {
            Self {
                reply: Ok(reply.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                reply: Err(message.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(LlmError::Network)
        }
    }
}
