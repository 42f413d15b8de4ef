pub mod ai_helper;
pub mod bank;
pub mod engine;
pub mod practice;
pub mod session;

use std::collections::HashSet;

use thiserror::Error;

/// One theory unit of a topic, paired with exactly one quiz question.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TheoryBlock {
    pub id: String,
    pub title: String,
    /// Rendered by the presentation layer, opaque to the engine.
    pub content: String,
    pub question: Question,
}

impl TheoryBlock {
    pub fn new(id: &str, title: &str, content: &str, question: Question) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            question,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub options: Vec<Answer>,
    pub explanation: String,
}

impl Question {
    pub fn new(id: &str, question: &str, options: Vec<Answer>, explanation: &str) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            options,
            explanation: explanation.to_string(),
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&Answer> {
        self.options.iter().find(|a| a.id == option_id)
    }

    pub fn correct_option(&self) -> Option<&Answer> {
        self.options.iter().find(|a| a.is_correct)
    }

    /// Unknown option ids count as wrong.
    pub fn is_correct(&self, option_id: &str) -> bool {
        self.option(option_id).map(|a| a.is_correct).unwrap_or(false)
    }

    /// A question is well-formed when it has a text, at least two options with
    /// distinct non-empty ids and exactly one of them marked correct.
    pub fn validate(&self) -> Result<(), QuizError> {
        let invalid = |reason: &str| QuizError::InvalidQuestion {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.question.trim().is_empty() {
            return Err(invalid("empty question text"));
        }
        if self.options.len() < 2 {
            return Err(invalid("fewer than two options"));
        }
        let mut seen = HashSet::new();
        for answer in &self.options {
            if answer.id.trim().is_empty() {
                return Err(invalid("option with empty id"));
            }
            if !seen.insert(answer.id.as_str()) {
                return Err(invalid("duplicate option id"));
            }
        }
        match self.options.iter().filter(|a| a.is_correct).count() {
            1 => Ok(()),
            0 => Err(invalid("no correct option")),
            _ => Err(invalid("more than one correct option")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub id: String,
    pub text: String,
    #[serde(rename = "correct")]
    pub is_correct: bool,
}

impl Answer {
    pub fn new(id: &str, text: &str, is_correct: bool) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
    #[error("topic {0} has no theory blocks")]
    NoTheory(String),
    #[error("duplicate block id: {0}")]
    DuplicateBlock(String),
    #[error("unknown block: {0}")]
    UnknownBlock(String),
    #[error("block {0} is locked")]
    Locked(String),
    #[error("no answer selected")]
    NoAnswerSelected,
    #[error("block {0} was already answered")]
    AlreadySubmitted(String),
    #[error("block {0} is already completed")]
    AlreadyCompleted(String),
    #[error("remediation for block {0} is still loading")]
    RemediationInFlight(String),
    #[error("block {0} has no wrong answer to retry")]
    NothingToRetry(String),
    #[error("question was not answered yet")]
    NotSubmitted,
    #[error("quiz is already finished")]
    Finished,
    #[error("invalid question {id}: {reason}")]
    InvalidQuestion { id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: Vec<Answer>) -> Question {
        Question::new("q", "Which one?", options, "Because.")
    }

    #[test]
    fn unknown_option_is_wrong() {
        let q = question(vec![Answer::new("a", "yes", true), Answer::new("b", "no", false)]);
        assert!(q.is_correct("a"));
        assert!(!q.is_correct("b"));
        assert!(!q.is_correct("z"));
        assert_eq!(q.correct_option().map(|a| a.text.as_str()), Some("yes"));
    }

    #[test]
    fn validate_requires_exactly_one_correct_option() {
        let ok = question(vec![Answer::new("a", "1", false), Answer::new("b", "2", true)]);
        assert!(ok.validate().is_ok());

        let none = question(vec![Answer::new("a", "1", false), Answer::new("b", "2", false)]);
        assert!(matches!(none.validate(), Err(QuizError::InvalidQuestion { .. })));

        let two = question(vec![Answer::new("a", "1", true), Answer::new("b", "2", true)]);
        assert!(two.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_or_missing_ids() {
        let dup = question(vec![Answer::new("a", "1", true), Answer::new("a", "2", false)]);
        assert!(dup.validate().is_err());

        let empty = question(vec![Answer::new("", "1", true), Answer::new("b", "2", false)]);
        assert!(empty.validate().is_err());

        let single = question(vec![Answer::new("a", "1", true)]);
        assert!(single.validate().is_err());
    }

    #[test]
    fn answer_uses_correct_on_the_wire() {
        let answer: Answer =
            serde_json::from_str(r#"{"id":"b","text":"O(n²)","correct":true}"#).unwrap();
        assert!(answer.is_correct);
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["correct"], true);
    }
}
