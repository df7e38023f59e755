use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Number of profile fields collected during information gathering.
pub const TOTAL_FIELDS: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience: String,
    pub position: String,
    pub location: String,
    pub tech_stack: Vec<String>,
}

impl CandidateRecord {
    pub fn filled_fields(&self) -> usize {
        let text_fields = [
            &self.name,
            &self.email,
            &self.phone,
            &self.experience,
            &self.position,
            &self.location,
        ];
        let filled = text_fields.iter().filter(|f| !f.is_empty()).count();
        filled + usize::from(!self.tech_stack.is_empty())
    }

    pub fn is_complete(&self) -> bool {
        self.filled_fields() == TOTAL_FIELDS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalQuestion {
    pub technology: String,
    pub text: String,
}

impl std::fmt::Display for TechnicalQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "**{}**: {}", self.technology, self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalAnswer {
    pub question: TechnicalQuestion,
    pub answer: String,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    InfoGathering,
    GeneratingQuestions,
    TechnicalQuestions,
    Conclusion,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Greeting => "Greeting",
            Stage::InfoGathering => "Info Gathering",
            Stage::GeneratingQuestions => "Generating Questions",
            Stage::TechnicalQuestions => "Technical Questions",
            Stage::Conclusion => "Conclusion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}
