use chrono::Local;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{error, info};

use crate::ai::LanguageModel;
use crate::error::{ConversationError, FAILURE_MARKER, QuestionError};
use crate::models::{CandidateRecord, Stage, TechnicalAnswer, TechnicalQuestion};
use crate::questions::{MAX_QUESTIONS, generate_questions};
use crate::tech_stack::{MIN_TECHNOLOGIES, TechCatalog, title_case};
use crate::validate::{
    MIN_LOCATION_LEN, MIN_NAME_LEN, MIN_POSITION_LEN, validate_email, validate_experience,
    validate_min_length, validate_phone,
};

pub const GREETING: &str = "🤖 **Welcome to TalentScout AI!**

I'm your intelligent hiring assistant, designed to streamline the initial screening process for technology positions.

**What I'll do:**
✅ Gather your essential information
✅ Understand your technical expertise
✅ Ask relevant technical questions
✅ Provide a smooth screening experience

Let's begin! Could you please tell me your **full name**?";

pub const ENDED_MESSAGE: &str =
    "This conversation has ended. Please start a new session to continue.";

pub const FAREWELL: &str = "👋 **Thank you for using TalentScout AI!**

We appreciate your time and interest. Our team will be in touch soon!

**Have a great day!** 🌟

*This conversation has ended. Start a new session to begin again.*";

const CONCLUSION_REPLY: &str = "Thank you for your question! Our team will provide comprehensive information during the next phase.

Is there anything else about the screening process, or are you ready to conclude?

*Say 'bye' or 'exit' when ready to end.*";

const ASSESSMENT_COMPLETE: &str = "🎉 **Technical Questions Complete!**

You've successfully answered all technical questions. Thank you for completing the screening process.

**Next Steps:**
- Our team will review your responses within 2-3 business days
- You'll receive an email update about the next phase
- If selected, we'll schedule a detailed technical interview

*You can say 'bye' or 'exit' when ready to end our conversation.*";

static ENDING_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\b(bye|goodbye|exit|quit|stop|end|finish)\b",
        r"\b(thank you|thanks).*(bye|goodbye|done)\b",
        r"\b(done|finished|complete)\b",
        r"\b(no more|nothing else|that's all)\b",
    ])
    .expect("valid ending patterns")
});

/// True when the candidate signals they want to stop, from any stage.
pub fn is_conversation_ending(input: &str) -> bool {
    ENDING_PATTERNS.is_match(&input.to_lowercase())
}

/// Everything the stage machine reads and mutates for one candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewState {
    pub candidate: CandidateRecord,
    pub stage: Stage,
    pub ended: bool,
    pub questions: Vec<TechnicalQuestion>,
    pub answers: Vec<TechnicalAnswer>,
    /// Index of the question awaiting an answer.
    pub cursor: usize,
}

// --- Information gathering ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
    Experience,
    Position,
    Location,
    TechStack,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::Experience => "Experience",
            Field::Position => "Position",
            Field::Location => "Location",
            Field::TechStack => "Tech Stack",
        }
    }

    fn is_set(self, candidate: &CandidateRecord) -> bool {
        match self {
            Field::Name => !candidate.name.is_empty(),
            Field::Email => !candidate.email.is_empty(),
            Field::Phone => !candidate.phone.is_empty(),
            Field::Experience => !candidate.experience.is_empty(),
            Field::Position => !candidate.position.is_empty(),
            Field::Location => !candidate.location.is_empty(),
            Field::TechStack => !candidate.tech_stack.is_empty(),
        }
    }
}

/// Validates one candidate message for a field and, when it passes, writes
/// the normalised value into the record.
type Accept = fn(&str, &TechCatalog, &mut CandidateRecord) -> bool;

struct FieldStep {
    field: Field,
    accept: Accept,
    retry: &'static str,
}

static FIELD_STEPS: [FieldStep; 7] = [
    FieldStep {
        field: Field::Name,
        accept: |input, _, candidate| {
            let value = input.trim();
            let ok = validate_min_length(value, MIN_NAME_LEN);
            if ok {
                candidate.name = title_case(value);
            }
            ok
        },
        retry: "Please provide your full name (at least 2 characters):",
    },
    FieldStep {
        field: Field::Email,
        accept: |input, _, candidate| {
            let value = input.trim();
            let ok = validate_email(value);
            if ok {
                candidate.email = value.to_lowercase();
            }
            ok
        },
        retry: "❌ Please provide a valid email address (e.g., name@company.com):",
    },
    FieldStep {
        field: Field::Phone,
        accept: |input, _, candidate| {
            let value = input.trim();
            let ok = validate_phone(value);
            if ok {
                candidate.phone = value.to_string();
            }
            ok
        },
        retry: "❌ Please provide a valid phone number:",
    },
    FieldStep {
        field: Field::Experience,
        accept: |input, _, candidate| {
            let value = input.trim();
            let ok = validate_experience(value);
            if ok {
                candidate.experience = value.to_string();
            }
            ok
        },
        retry: "❌ Please provide your years of experience as a number:",
    },
    FieldStep {
        field: Field::Position,
        accept: |input, _, candidate| {
            let value = input.trim();
            let ok = validate_min_length(value, MIN_POSITION_LEN);
            if ok {
                candidate.position = title_case(value);
            }
            ok
        },
        retry: "Please provide a valid position title (at least 3 characters):",
    },
    FieldStep {
        field: Field::Location,
        accept: |input, _, candidate| {
            let value = input.trim();
            let ok = validate_min_length(value, MIN_LOCATION_LEN);
            if ok {
                candidate.location = title_case(value);
            }
            ok
        },
        retry: "Please provide your location (at least 2 characters):",
    },
    FieldStep {
        field: Field::TechStack,
        accept: |input, catalog, candidate| {
            let techs = catalog.extract(input);
            let ok = techs.len() >= MIN_TECHNOLOGIES;
            if ok {
                candidate.tech_stack = techs;
            }
            ok
        },
        retry: "❌ I need at least 2 technologies to generate relevant questions. Please provide more technical skills.",
    },
];

/// Step for the first field still unset, in collection order.
fn pending_step(candidate: &CandidateRecord) -> Option<&'static FieldStep> {
    FIELD_STEPS.iter().find(|step| !step.field.is_set(candidate))
}

/// First field still unset, in collection order.
pub fn next_field(candidate: &CandidateRecord) -> Option<Field> {
    pending_step(candidate).map(|step| step.field)
}

fn field_confirmation(field: Field, candidate: &CandidateRecord) -> String {
    match field {
        Field::Name => format!(
            "Nice to meet you, **{}**! 📧\n\nCould you please provide your **email address**?",
            candidate.name
        ),
        Field::Email => {
            "📱 Perfect! Now, could you please provide your **phone number**?".to_string()
        }
        Field::Phone => "💼 Great! How many **years of professional experience** do you have?\n\n\
             *Please provide a number (e.g., '3 years' or '5')*"
            .to_string(),
        Field::Experience => "🎯 Excellent! What **position(s)** are you interested in?\n\n\
             *Examples: Software Engineer, Data Scientist, Full Stack Developer*"
            .to_string(),
        Field::Position => {
            "📍 Perfect! Could you please tell me your **current location**?".to_string()
        }
        Field::Location => "🛠️ Finally, let's discuss your technical expertise!\n\n\
             Please list your **technical skills and tech stack**:\n\n\
             **Example:** \"Python, Django, React, PostgreSQL, AWS, Docker\"\n\n\
             *This helps me generate relevant technical questions.*"
            .to_string(),
        Field::TechStack => format!(
            "✅ **Information Collection Complete!**\n\n\
             **Summary:**\n\
             - **Name:** {}\n\
             - **Email:** {}\n\
             - **Position:** {}\n\
             - **Experience:** {}\n\
             - **Tech Stack:** {}\n\n\
             🧠 **Generating Technical Questions...please type \"continue\"**",
            candidate.name,
            candidate.email,
            candidate.position,
            candidate.experience,
            candidate.tech_stack.join(", ")
        ),
    }
}

fn question_prompt(state: &InterviewState) -> Result<String, ConversationError> {
    let total = state.questions.len();
    let question = state
        .questions
        .get(state.cursor)
        .ok_or(ConversationError::QuestionOutOfRange {
            index: state.cursor,
            total,
        })?;
    Ok(format!(
        "**Question {} of {}:**\n{}",
        state.cursor + 1,
        total,
        question
    ))
}

// --- Stage machine ---

/// Borrowed collaborators needed to run a turn.
pub struct Interviewer<'a> {
    model: &'a dyn LanguageModel,
    catalog: &'a TechCatalog,
}

impl<'a> Interviewer<'a> {
    pub fn new(model: &'a dyn LanguageModel, catalog: &'a TechCatalog) -> Self {
        Self { model, catalog }
    }

    /// Runs one candidate turn and returns the assistant reply.
    ///
    /// Stage handlers work on a copy of `state`; the copy replaces `state`
    /// only when the handler succeeds.
    pub fn respond(&self, state: &mut InterviewState, input: &str) -> String {
        if state.ended {
            return ENDED_MESSAGE.to_string();
        }

        if is_conversation_ending(input) {
            info!(stage = state.stage.label(), "Conversation ended by candidate");
            state.ended = true;
            return FAREWELL.to_string();
        }

        let mut working = state.clone();
        match self.dispatch(&mut working, input) {
            Ok(reply) => {
                if working.stage != state.stage {
                    info!(from = state.stage.label(), to = working.stage.label(), "Stage transition");
                }
                *state = working;
                reply
            }
            Err(e) => {
                error!(error = %e, stage = state.stage.label(), "Turn failed");
                format!(
                    "{} An error occurred. Please try again.\n\nError: {}",
                    FAILURE_MARKER, e
                )
            }
        }
    }

    fn dispatch(&self, state: &mut InterviewState, input: &str) -> Result<String, ConversationError> {
        match state.stage {
            Stage::Greeting => {
                state.stage = Stage::InfoGathering;
                self.gather_information(state, input)
            }
            Stage::InfoGathering => self.gather_information(state, input),
            Stage::GeneratingQuestions => self.prepare_assessment(state),
            Stage::TechnicalQuestions => record_answer(state, input),
            Stage::Conclusion => Ok(CONCLUSION_REPLY.to_string()),
        }
    }

    fn gather_information(
        &self,
        state: &mut InterviewState,
        input: &str,
    ) -> Result<String, ConversationError> {
        let step = pending_step(&state.candidate).ok_or(ConversationError::NothingToGather)?;

        if !(step.accept)(input, self.catalog, &mut state.candidate) {
            return Ok(step.retry.to_string());
        }

        if step.field == Field::TechStack {
            state.stage = Stage::GeneratingQuestions;
        }
        Ok(field_confirmation(step.field, &state.candidate))
    }

    fn prepare_assessment(&self, state: &mut InterviewState) -> Result<String, ConversationError> {
        if state.candidate.tech_stack.is_empty() {
            return Err(ConversationError::MissingTechStack {
                stage: state.stage.label(),
            });
        }

        let count = state.candidate.tech_stack.len().min(MAX_QUESTIONS);
        match generate_questions(self.model, &state.candidate.tech_stack, count) {
            Ok(questions) => {
                info!(count = questions.len(), "Technical questions ready");
                state.questions = questions;
                state.cursor = 0;
                state.stage = Stage::TechnicalQuestions;
                Ok(format!(
                    "🧠 **Technical Assessment Ready!**\n\n{}\n\n\
                     *Please provide your answer based on your experience. \
                     If you can't answer the question type \"Continue\"*",
                    question_prompt(state)?
                ))
            }
            Err(e) => {
                let detail = match &e {
                    QuestionError::Gateway { source, .. } => source.user_message(),
                    other => format!("{} {}", FAILURE_MARKER, other),
                };
                Ok(format!(
                    "{} I encountered an issue generating questions. Please try again.\n\n{}",
                    FAILURE_MARKER, detail
                ))
            }
        }
    }
}

fn record_answer(state: &mut InterviewState, input: &str) -> Result<String, ConversationError> {
    let answer = input.trim();
    let total = state.questions.len();
    let question = state
        .questions
        .get(state.cursor)
        .cloned()
        .ok_or(ConversationError::QuestionOutOfRange {
            index: state.cursor,
            total,
        })?;

    if answer.is_empty() {
        return Ok(format!(
            "Please type an answer, or \"continue\" to skip.\n\n{}",
            question_prompt(state)?
        ));
    }

    state.answers.push(TechnicalAnswer {
        question,
        answer: answer.to_string(),
        timestamp: Local::now(),
    });
    state.cursor += 1;

    if state.cursor < total {
        Ok(format!(
            "✅ **Thank you for your answer!**\n\n{}\n\n\
             *Please provide your answer based on your experience.*",
            question_prompt(state)?
        ))
    } else {
        state.stage = Stage::Conclusion;
        Ok(ASSESSMENT_COMPLETE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::questions::tests::ScriptedModel;

    const CANDIDATE_TURNS: [&str; 7] = [
        "Jane Doe",
        "jane@co.io",
        "+14155550100",
        "4 years",
        "Backend Engineer",
        "Austin",
        "Python, Django, PostgreSQL",
    ];

    fn fill_profile(interviewer: &Interviewer, state: &mut InterviewState) {
        for turn in CANDIDATE_TURNS {
            interviewer.respond(state, turn);
        }
    }

    #[test]
    fn test_end_to_end_profile_collection() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();

        fill_profile(&interviewer, &mut state);

        let c = &state.candidate;
        assert_eq!(c.name, "Jane Doe");
        assert_eq!(c.email, "jane@co.io");
        assert_eq!(c.phone, "+14155550100");
        assert_eq!(c.experience, "4 years");
        assert_eq!(c.position, "Backend Engineer");
        assert_eq!(c.location, "Austin");
        assert_eq!(c.tech_stack, vec!["Python", "Django", "Postgresql"]);
        assert!(c.is_complete());
        assert_eq!(state.stage, Stage::GeneratingQuestions);
        assert!(!state.ended);
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn test_greeting_input_is_not_discarded() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();

        let reply = interviewer.respond(&mut state, "jane doe");
        assert_eq!(state.stage, Stage::InfoGathering);
        assert_eq!(state.candidate.name, "Jane Doe");
        assert!(reply.contains("Nice to meet you, **Jane Doe**"));
    }

    #[test]
    fn test_invalid_field_reprompts_same_field() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();

        interviewer.respond(&mut state, "Jane Doe");
        let reply = interviewer.respond(&mut state, "not-an-email");
        assert!(reply.contains("valid email address"));
        assert!(state.candidate.email.is_empty());

        // A valid phone number is not tried against the phone field
        let reply = interviewer.respond(&mut state, "+14155550100");
        assert!(reply.contains("valid email address"));
        assert!(state.candidate.phone.is_empty());

        let reply = interviewer.respond(&mut state, "Jane@CO.io");
        assert!(reply.contains("phone number"));
        assert_eq!(state.candidate.email, "jane@co.io");
    }

    #[test]
    fn test_fields_fill_left_to_right() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();

        let inputs = [
            "x", "", " ", "J", "Jo", "fifty", "a@b.co", "0123456789", "123", "4155550100",
            "fifty", "75 years", "3", "QA", "SRE", "X", "NY", "just python", "go and rust",
        ];

        for input in inputs {
            interviewer.respond(&mut state, input);
            let c = &state.candidate;
            let set = [
                !c.name.is_empty(),
                !c.email.is_empty(),
                !c.phone.is_empty(),
                !c.experience.is_empty(),
                !c.position.is_empty(),
                !c.location.is_empty(),
                !c.tech_stack.is_empty(),
            ];
            // Once a field is unset, every later field is unset too
            if let Some(first_unset) = set.iter().position(|s| !s) {
                assert!(set[first_unset..].iter().all(|s| !s), "out of order after {:?}", input);
            }
        }

        let c = &state.candidate;
        assert_eq!(c.name, "Jo");
        assert_eq!(c.email, "a@b.co");
        assert_eq!(c.phone, "4155550100");
        assert_eq!(c.experience, "3");
        assert_eq!(c.position, "Sre");
        assert_eq!(c.location, "Ny");
        assert_eq!(c.tech_stack, vec!["Go", "Rust"]);
        assert_eq!(state.stage, Stage::GeneratingQuestions);
    }

    #[test]
    fn test_single_technology_is_rejected() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();

        for turn in &CANDIDATE_TURNS[..6] {
            interviewer.respond(&mut state, turn);
        }
        let reply = interviewer.respond(&mut state, "Mostly Python");
        assert!(reply.contains("at least 2 technologies"));
        assert!(state.candidate.tech_stack.is_empty());
        assert_eq!(state.stage, Stage::InfoGathering);
    }

    #[test]
    fn test_question_generation_and_answers() {
        let model = ScriptedModel::answering(&["Q python?", "Q django?", "Q postgres?"]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();
        fill_profile(&interviewer, &mut state);

        let reply = interviewer.respond(&mut state, "continue");
        assert_eq!(state.stage, Stage::TechnicalQuestions);
        assert_eq!(state.questions.len(), 3);
        assert_eq!(state.cursor, 0);
        assert!(reply.contains("Question 1 of 3"));
        assert!(reply.contains("**Python**: Q python?"));

        let reply = interviewer.respond(&mut state, "I would use cProfile.");
        assert_eq!(state.answers.len(), 1);
        assert_eq!(state.stage, Stage::TechnicalQuestions);
        assert!(reply.contains("Question 2 of 3"));

        // "continue" skips but is still recorded
        interviewer.respond(&mut state, "continue");
        assert_eq!(state.answers.len(), 2);
        assert_eq!(state.answers[1].answer, "continue");
        assert_eq!(state.stage, Stage::TechnicalQuestions);

        let reply = interviewer.respond(&mut state, "Indexes and EXPLAIN ANALYZE.");
        assert_eq!(state.answers.len(), 3);
        assert_eq!(state.cursor, 3);
        assert_eq!(state.stage, Stage::Conclusion);
        assert!(reply.contains("Technical Questions Complete"));

        assert_eq!(state.answers[0].question.technology, "Python");
        assert_eq!(state.answers[2].question.technology, "Postgresql");

        let reply = interviewer.respond(&mut state, "When will I hear back?");
        assert_eq!(reply, CONCLUSION_REPLY);
        assert_eq!(state.stage, Stage::Conclusion);
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn test_blank_answer_is_not_recorded() {
        let model = ScriptedModel::answering(&["q1", "q2"]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();
        for turn in &CANDIDATE_TURNS[..6] {
            interviewer.respond(&mut state, turn);
        }
        interviewer.respond(&mut state, "rust and redis");
        interviewer.respond(&mut state, "continue");
        assert_eq!(state.questions.len(), 2);

        let reply = interviewer.respond(&mut state, "   ");
        assert!(reply.contains("Question 1 of 2"));
        assert!(state.answers.is_empty());
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn test_generation_failure_keeps_stage_and_retries() {
        let model = ScriptedModel::new(vec![
            Ok("Q python?".to_string()),
            Err(GatewayError::Timeout),
            Ok("Q python again?".to_string()),
            Ok("Q django?".to_string()),
            Ok("Q postgres?".to_string()),
        ]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();
        fill_profile(&interviewer, &mut state);

        let reply = interviewer.respond(&mut state, "continue");
        assert!(reply.starts_with(FAILURE_MARKER));
        assert!(reply.contains("issue generating questions"));
        assert!(reply.contains("timed out"));
        assert_eq!(state.stage, Stage::GeneratingQuestions);
        assert!(state.questions.is_empty());

        let reply = interviewer.respond(&mut state, "continue");
        assert_eq!(state.stage, Stage::TechnicalQuestions);
        assert!(reply.contains("Q python again?"));
        assert_eq!(model.calls(), 5);
    }

    #[test]
    fn test_not_configured_gateway_is_reported() {
        let model = ScriptedModel::new(vec![Err(GatewayError::NotConfigured)]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();
        fill_profile(&interviewer, &mut state);

        let reply = interviewer.respond(&mut state, "continue");
        assert!(reply.contains("API key not configured"));
        assert_eq!(state.stage, Stage::GeneratingQuestions);
    }

    #[test]
    fn test_ending_detection_patterns() {
        assert!(is_conversation_ending("ok thanks, bye!"));
        assert!(is_conversation_ending("Goodbye"));
        assert!(is_conversation_ending("EXIT"));
        assert!(is_conversation_ending("thank you, I'm done"));
        assert!(is_conversation_ending("that's all"));
        assert!(is_conversation_ending("nothing else for now"));
        assert!(is_conversation_ending("I think I'm finished"));

        assert!(!is_conversation_ending("Backend Engineer"));
        assert!(!is_conversation_ending("Python, Django, PostgreSQL"));
        assert!(!is_conversation_ending("thanks"));
        assert!(!is_conversation_ending("weekend plans"));
    }

    #[test]
    fn test_ending_takes_precedence_from_any_stage() {
        let catalog = TechCatalog::default();

        for prefix in 0..=CANDIDATE_TURNS.len() {
            let model = ScriptedModel::answering(&[]);
            let interviewer = Interviewer::new(&model, &catalog);
            let mut state = InterviewState::default();
            for turn in &CANDIDATE_TURNS[..prefix] {
                interviewer.respond(&mut state, turn);
            }
            let before = state.candidate.clone();
            let stage = state.stage;

            let reply = interviewer.respond(&mut state, "ok thanks, bye!");
            assert_eq!(reply, FAREWELL);
            assert!(state.ended);
            assert_eq!(state.stage, stage);

            let reply = interviewer.respond(&mut state, "Actually, my name is Bob");
            assert_eq!(reply, ENDED_MESSAGE);
            let reply = interviewer.respond(&mut state, "continue");
            assert_eq!(reply, ENDED_MESSAGE);
            assert_eq!(state.candidate, before);
            assert_eq!(state.stage, stage);
            assert!(state.ended);
            assert_eq!(model.calls(), 0);
        }
    }

    fn start_assessment(interviewer: &Interviewer, state: &mut InterviewState) {
        fill_profile(interviewer, state);
        interviewer.respond(state, "continue");
        assert_eq!(state.stage, Stage::TechnicalQuestions);
    }

    fn assert_ends_without_recording(
        interviewer: &Interviewer,
        state: &mut InterviewState,
        input: &str,
    ) {
        let answers = state.answers.len();
        let cursor = state.cursor;
        let stage = state.stage;

        assert_eq!(interviewer.respond(state, input), FAREWELL);
        assert!(state.ended);
        assert_eq!(state.answers.len(), answers);
        assert_eq!(state.cursor, cursor);
        assert_eq!(state.stage, stage);

        assert_eq!(interviewer.respond(state, "Use a connection pool."), ENDED_MESSAGE);
        assert_eq!(state.answers.len(), answers);
        assert_eq!(state.cursor, cursor);
    }

    #[test]
    fn test_ending_during_technical_questions() {
        let model = ScriptedModel::answering(&["Q python?", "Q django?", "Q postgres?"]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();
        start_assessment(&interviewer, &mut state);
        interviewer.respond(&mut state, "I would use cProfile.");
        assert_eq!(state.cursor, 1);

        assert_ends_without_recording(&interviewer, &mut state, "ok thanks, bye!");
        assert_eq!(state.answers.len(), 1);
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn test_answer_with_ending_word_ends_conversation() {
        let catalog = TechCatalog::default();

        for answer in ["I'm done with this one", "I would end the transaction early"] {
            let model = ScriptedModel::answering(&["Q python?", "Q django?", "Q postgres?"]);
            let interviewer = Interviewer::new(&model, &catalog);
            let mut state = InterviewState::default();
            start_assessment(&interviewer, &mut state);
            assert_ends_without_recording(&interviewer, &mut state, answer);
            assert!(state.answers.is_empty());
            assert_eq!(state.cursor, 0);
        }
    }

    #[test]
    fn test_ending_during_conclusion() {
        let model = ScriptedModel::answering(&["Q python?", "Q django?", "Q postgres?"]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState::default();
        start_assessment(&interviewer, &mut state);
        for answer in ["Profiling first.", "Middleware.", "Indexes."] {
            interviewer.respond(&mut state, answer);
        }
        assert_eq!(state.stage, Stage::Conclusion);

        assert_ends_without_recording(&interviewer, &mut state, "ok thanks, bye!");
        assert_eq!(state.answers.len(), 3);
        assert_eq!(state.stage, Stage::Conclusion);
    }

    #[test]
    fn test_field_steps_write_only_their_field() {
        let catalog = TechCatalog::default();
        for (step, turn) in FIELD_STEPS.iter().zip(CANDIDATE_TURNS) {
            let mut record = CandidateRecord::default();
            assert!(!(step.accept)("x", &catalog, &mut record));
            assert_eq!(record, CandidateRecord::default());

            assert!((step.accept)(turn, &catalog, &mut record));
            assert_eq!(record.filled_fields(), 1);
            assert!(step.field.is_set(&record));
        }
    }

    #[test]
    fn test_fault_leaves_state_untouched() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState {
            stage: Stage::TechnicalQuestions,
            ..InterviewState::default()
        };

        let reply = interviewer.respond(&mut state, "my answer");
        assert!(reply.starts_with(FAILURE_MARKER));
        assert!(reply.contains("No question at position 0"));
        assert!(state.answers.is_empty());
        assert_eq!(state.cursor, 0);
        assert_eq!(state.stage, Stage::TechnicalQuestions);
    }

    #[test]
    fn test_missing_tech_stack_is_a_fault() {
        let model = ScriptedModel::answering(&["unused"]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut state = InterviewState {
            stage: Stage::GeneratingQuestions,
            ..InterviewState::default()
        };

        let reply = interviewer.respond(&mut state, "continue");
        assert!(reply.contains("Tech stack is empty"));
        assert_eq!(state.stage, Stage::GeneratingQuestions);
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn test_next_field_order() {
        let mut record = CandidateRecord::default();
        assert_eq!(next_field(&record), Some(Field::Name));
        record.name = "Jo".to_string();
        assert_eq!(next_field(&record), Some(Field::Email));
        record.email = "a@b.co".to_string();
        record.phone = "4155550100".to_string();
        record.experience = "3".to_string();
        record.position = "SRE".to_string();
        record.location = "NY".to_string();
        assert_eq!(next_field(&record), Some(Field::TechStack));
        record.tech_stack = vec!["Go".to_string(), "Rust".to_string()];
        assert_eq!(next_field(&record), None);
    }
}
