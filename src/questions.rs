use tracing::{debug, warn};

use crate::ai::{CompletionRequest, LanguageModel};
use crate::error::QuestionError;
use crate::models::{ChatMessage, TechnicalQuestion};

/// Upper bound on questions in one assessment.
pub const MAX_QUESTIONS: usize = 3;

const QUESTION_MAX_TOKENS: u32 = 200;
const QUESTION_TEMPERATURE: f32 = 0.8;

const INTERVIEWER_INSTRUCTION: &str = "You are an expert technical interviewer. \
     Generate practical, professional-level interview questions.";

fn question_prompt(technology: &str) -> String {
    format!(
        "Generate 1 technical interview question for {} technology.\n\n\
        Requirements:\n\
        - Assess practical knowledge and problem-solving skills\n\
        - Appropriate for professional experience level\n\
        - Not too basic or extremely advanced\n\
        - Answerable in 2-3 paragraphs\n\
        - Focus on real-world scenarios\n\n\
        Return only the question without additional formatting.",
        technology
    )
}

/// Asks the model for one question per technology, for at most
/// `min(count, MAX_QUESTIONS)` technologies.
///
/// Any failed call fails the whole batch; questions produced before the
/// failure are discarded.
pub fn generate_questions(
    model: &dyn LanguageModel,
    technologies: &[String],
    count: usize,
) -> Result<Vec<TechnicalQuestion>, QuestionError> {
    let take = count.min(MAX_QUESTIONS).min(technologies.len());
    if take == 0 {
        return Err(QuestionError::NoTechnologies);
    }

    let mut questions = Vec::with_capacity(take);
    for technology in &technologies[..take] {
        let request = CompletionRequest::new(question_prompt(technology))
            .max_tokens(QUESTION_MAX_TOKENS)
            .temperature(QUESTION_TEMPERATURE)
            .context(vec![ChatMessage::system(INTERVIEWER_INSTRUCTION)]);

        let raw = model.complete(&request).map_err(|source| {
            warn!(%technology, error = %source, "Question generation failed");
            QuestionError::Gateway {
                technology: technology.clone(),
                source,
            }
        })?;

        let text = clean_question(&raw);
        if text.is_empty() {
            return Err(QuestionError::EmptyQuestion {
                technology: technology.clone(),
            });
        }

        debug!(%technology, "Generated question");
        questions.push(TechnicalQuestion {
            technology: technology.clone(),
            text,
        });
    }

    Ok(questions)
}

// Quotes are dropped everywhere, not only at the ends.
fn clean_question(raw: &str) -> String {
    raw.trim().replace(['"', '\''], "").trim().to_string()
}
