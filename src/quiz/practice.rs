use log::warn;
use rand::seq::SliceRandom;

use crate::quiz::ai_helper::{RemediationError, RemediationReply, RemediationRequest};
use crate::quiz::{Question, QuizError};

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeOutcome {
    Correct,
    Incorrect(RemediationRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeStep {
    Advanced(usize),
    Finished { score: u32, total: usize },
}

/// Linear quiz: one question after another, with a running score. Wrong
/// answers get an explanation but no replacement question.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PracticeQuiz {
    pub questions: Vec<Question>,
    pub current_question: usize,
    pub score: u32,
    pub selected: Option<String>,
    pub submitted: bool,
    pub correct: bool,
    pub ai_explanation: String,
    pub is_loading_ai: bool,
}

impl PracticeQuiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    /// Picks `amount` distinct questions at random.
    pub fn random(questions: &[Question], amount: usize) -> Self {
        Self::new(
            questions
                .choose_multiple(&mut rand::thread_rng(), amount)
                .cloned()
                .collect(),
        )
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.get(self.current_question)
    }

    pub fn select_answer(&mut self, option_id: &str) -> Result<(), QuizError> {
        if self.question().is_none() {
            return Err(QuizError::Finished);
        }
        if self.submitted {
            return Err(QuizError::AlreadySubmitted(self.current_question.to_string()));
        }
        self.selected = Some(option_id.to_string());
        Ok(())
    }

    pub fn submit(&mut self) -> Result<PracticeOutcome, QuizError> {
        let question = self.question().cloned().ok_or(QuizError::Finished)?;
        if self.submitted {
            return Err(QuizError::AlreadySubmitted(self.current_question.to_string()));
        }
        let selected = match self.selected.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => return Err(QuizError::NoAnswerSelected),
        };

        self.submitted = true;
        self.correct = question.is_correct(&selected);
        if self.correct {
            self.score += 1;
            return Ok(PracticeOutcome::Correct);
        }

        self.is_loading_ai = true;
        Ok(PracticeOutcome::Incorrect(RemediationRequest::for_answer(
            &question, &selected, 0,
        )))
    }

    pub fn apply_remediation(&mut self, result: Result<RemediationReply, RemediationError>) {
        if !self.is_loading_ai {
            return;
        }
        self.is_loading_ai = false;
        self.ai_explanation = match result {
            Ok(RemediationReply::Explained { explanation, .. }) => explanation,
            Ok(RemediationReply::Degraded { explanation, .. }) => explanation,
            Err(e) => {
                warn!("Remediation failed, showing the static explanation: {}", e);
                self.question()
                    .map(|q| q.explanation.clone())
                    .unwrap_or_default()
            }
        };
    }

    pub fn next(&mut self) -> Result<PracticeStep, QuizError> {
        if !self.submitted {
            return Err(QuizError::NotSubmitted);
        }
        if self.is_loading_ai {
            return Err(QuizError::RemediationInFlight(self.current_question.to_string()));
        }
        if self.current_question + 1 >= self.questions.len() {
            return Ok(PracticeStep::Finished {
                score: self.score,
                total: self.questions.len(),
            });
        }

        self.current_question += 1;
        self.selected = None;
        self.submitted = false;
        self.correct = false;
        self.ai_explanation.clear();
        Ok(PracticeStep::Advanced(self.current_question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::bank::practice_questions;
    use std::collections::HashSet;

    #[test]
    fn full_run_counts_the_score() {
        let mut quiz = PracticeQuiz::new(practice_questions());

        quiz.select_answer("b").unwrap();
        assert_eq!(quiz.submit().unwrap(), PracticeOutcome::Correct);
        assert_eq!(quiz.next().unwrap(), PracticeStep::Advanced(1));

        quiz.select_answer("c").unwrap();
        let request = match quiz.submit().unwrap() {
            PracticeOutcome::Incorrect(request) => request,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(request.correct_answer, "The array must be sorted");
        assert_eq!(request.attempt_count, 0);
        assert_eq!(quiz.next(), Err(QuizError::RemediationInFlight("1".to_string())));

        quiz.apply_remediation(Ok(RemediationReply::Explained {
            explanation: "Halving needs order.".to_string(),
            new_question: None,
        }));
        assert_eq!(quiz.ai_explanation, "Halving needs order.");
        assert_eq!(
            quiz.next().unwrap(),
            PracticeStep::Finished { score: 1, total: 2 }
        );
    }

    #[test]
    fn failure_falls_back_to_static_explanation() {
        let mut quiz = PracticeQuiz::new(practice_questions());
        quiz.select_answer("a").unwrap();
        quiz.submit().unwrap();
        quiz.apply_remediation(Err(RemediationError::Status(502)));
        assert!(!quiz.is_loading_ai);
        assert_eq!(
            quiz.ai_explanation,
            "Bubble sort has two nested loops, which gives quadratic complexity O(n²)."
        );
    }

    #[test]
    fn submit_needs_a_selection() {
        let mut quiz = PracticeQuiz::new(practice_questions());
        assert_eq!(quiz.submit(), Err(QuizError::NoAnswerSelected));
        assert!(!quiz.submitted);
        assert_eq!(quiz.next(), Err(QuizError::NotSubmitted));
    }

    #[test]
    fn empty_quiz_is_finished() {
        let mut quiz = PracticeQuiz::new(Vec::new());
        assert_eq!(quiz.select_answer("a"), Err(QuizError::Finished));
        assert_eq!(quiz.submit(), Err(QuizError::Finished));
    }

    #[test]
    fn random_picks_distinct_questions() {
        let quiz = PracticeQuiz::random(&practice_questions(), 2);
        let ids: HashSet<_> = quiz.questions.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 2);

        let capped = PracticeQuiz::random(&practice_questions(), 10);
        assert_eq!(capped.questions.len(), 2);
    }
}
