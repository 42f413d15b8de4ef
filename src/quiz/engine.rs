//! Per-block quiz progression for the theory section of a topic.
//!
//! Every block carries one question. A block becomes interactive once the
//! previous block was answered correctly. Wrong answers go through a
//! remediation round trip that may hand back a replacement question, which
//! the learner accepts with [`TheoryEngine::retry`].
//!
//! The engine never awaits. [`TheoryEngine::submit`] hands out a
//! [`RemediationTicket`] for a wrong answer and the caller feeds the outcome
//! of the remediation call back through [`TheoryEngine::apply_remediation`].

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::quiz::ai_helper::{RemediationError, RemediationReply, RemediationRequest};
use crate::quiz::bank::Topic;
use crate::quiz::{Question, QuizError, TheoryBlock};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BlockState {
    pub selected_answer: Option<String>,
    pub is_submitted: bool,
    pub is_correct: bool,
    pub ai_explanation: String,
    pub is_loading_ai: bool,
    pub pending_question: Option<Question>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Correct {
        /// Block the presentation layer should bring into view.
        next_block: Option<String>,
        /// Set only the first time the last block of the topic completes.
        topic_completed: bool,
    },
    Incorrect(RemediationTicket),
}

/// Handle for one outstanding remediation call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationTicket {
    pub block_id: String,
    pub seq: u64,
    pub request: RemediationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemediationApplied {
    Explained { has_retry_question: bool },
    Degraded { notice: String },
    /// The gateway failed and the static explanation is shown instead.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct TheoryEngine {
    topic: Topic,
    blocks: Vec<TheoryBlock>,
    active: HashMap<String, Question>,
    states: HashMap<String, BlockState>,
    completed: Vec<String>,
    attempts: HashMap<String, u32>,
    seq: u64,
    in_flight: HashMap<String, u64>,
    completion_signalled: bool,
}

impl TheoryEngine {
    pub fn for_topic(topic: Topic) -> Result<Self, QuizError> {
        let blocks = topic.blocks();
        if blocks.is_empty() {
            return Err(QuizError::NoTheory(topic.slug().to_string()));
        }
        Self::new(topic, blocks)
    }

    pub fn new(topic: Topic, blocks: Vec<TheoryBlock>) -> Result<Self, QuizError> {
        let mut seen = HashSet::new();
        for block in &blocks {
            if !seen.insert(block.id.clone()) {
                return Err(QuizError::DuplicateBlock(block.id.clone()));
            }
        }

        let active = blocks
            .iter()
            .map(|b| (b.id.clone(), b.question.clone()))
            .collect();

        Ok(Self {
            topic,
            blocks,
            active,
            states: HashMap::new(),
            completed: Vec::new(),
            attempts: HashMap::new(),
            seq: 0,
            in_flight: HashMap::new(),
            completion_signalled: false,
        })
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn blocks(&self) -> &[TheoryBlock] {
        &self.blocks
    }

    /// Ids of correctly answered blocks, in completion order.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn is_completed(&self, block_id: &str) -> bool {
        self.completed.iter().any(|id| id == block_id)
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.completed.len(), self.blocks.len())
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        if index == 0 {
            return index < self.blocks.len();
        }
        match self.blocks.get(index) {
            Some(_) => self.is_completed(&self.blocks[index - 1].id),
            None => false,
        }
    }

    pub fn is_block_unlocked(&self, block_id: &str) -> bool {
        self.index_of(block_id)
            .map(|i| self.is_unlocked(i))
            .unwrap_or(false)
    }

    /// State of a block; blocks never touched report the initial state.
    pub fn block_state(&self, block_id: &str) -> BlockState {
        self.states.get(block_id).cloned().unwrap_or_default()
    }

    /// Question currently asked for the block, accounting for accepted retries
    /// but not for a pending replacement that was not accepted yet.
    pub fn active_question(&self, block_id: &str) -> Option<&Question> {
        self.active.get(block_id)
    }

    pub fn attempts(&self, block_id: &str) -> u32 {
        self.attempts.get(block_id).copied().unwrap_or(0)
    }

    pub fn select_answer(&mut self, block_id: &str, option_id: &str) -> Result<(), QuizError> {
        self.ensure_interactive(block_id)?;
        let state = self.states.entry(block_id.to_string()).or_default();
        if state.is_submitted {
            return Err(if state.is_correct {
                QuizError::AlreadyCompleted(block_id.to_string())
            } else {
                QuizError::AlreadySubmitted(block_id.to_string())
            });
        }
        state.selected_answer = Some(option_id.to_string());
        Ok(())
    }

    pub fn submit(&mut self, block_id: &str) -> Result<SubmitOutcome, QuizError> {
        let index = self.ensure_interactive(block_id)?;
        let state = self.states.entry(block_id.to_string()).or_default();
        if state.is_loading_ai {
            return Err(QuizError::RemediationInFlight(block_id.to_string()));
        }
        if state.is_submitted {
            return Err(if state.is_correct {
                QuizError::AlreadyCompleted(block_id.to_string())
            } else {
                QuizError::AlreadySubmitted(block_id.to_string())
            });
        }
        let selected = match &state.selected_answer {
            Some(selected) if !selected.is_empty() => selected.clone(),
            _ => return Err(QuizError::NoAnswerSelected),
        };

        let question = match &state.pending_question {
            Some(pending) => pending.clone(),
            None => self
                .active
                .get(block_id)
                .cloned()
                .ok_or_else(|| QuizError::UnknownBlock(block_id.to_string()))?,
        };
        let correct = question.is_correct(&selected);

        state.is_submitted = true;
        state.is_correct = correct;

        if correct {
            if !self.is_completed(block_id) {
                self.completed.push(block_id.to_string());
            }
            let next_block = self.blocks.get(index + 1).map(|b| b.id.clone());
            let topic_completed = next_block.is_none() && !self.completion_signalled;
            if topic_completed {
                self.completion_signalled = true;
            }
            return Ok(SubmitOutcome::Correct {
                next_block,
                topic_completed,
            });
        }

        state.is_loading_ai = true;
        let attempt_count = self.attempts.get(block_id).copied().unwrap_or(0);
        self.attempts
            .insert(block_id.to_string(), attempt_count.saturating_add(1));

        self.seq += 1;
        self.in_flight.insert(block_id.to_string(), self.seq);

        Ok(SubmitOutcome::Incorrect(RemediationTicket {
            block_id: block_id.to_string(),
            seq: self.seq,
            request: RemediationRequest::for_answer(&question, &selected, attempt_count),
        }))
    }

    /// Feeds the result of a remediation call back into the block it was made
    /// for. Returns `None` when the ticket no longer matches an outstanding
    /// call, in which case nothing changes.
    pub fn apply_remediation(
        &mut self,
        ticket: &RemediationTicket,
        result: Result<RemediationReply, RemediationError>,
    ) -> Option<RemediationApplied> {
        if self.in_flight.get(&ticket.block_id) != Some(&ticket.seq) {
            debug!(
                "Discarding stale remediation for block {} (seq {})",
                ticket.block_id, ticket.seq
            );
            return None;
        }
        self.in_flight.remove(&ticket.block_id);

        let active = self.active.get(&ticket.block_id).cloned();
        let state = self.states.get_mut(&ticket.block_id)?;
        if !state.is_loading_ai {
            return None;
        }
        state.is_loading_ai = false;

        // The wrong answer may have been given to a pending replacement.
        let asked = match (&state.pending_question, active) {
            (Some(pending), _) => pending.clone(),
            (None, Some(active)) => active,
            (None, None) => return None,
        };

        let applied = match result {
            Ok(RemediationReply::Explained {
                explanation,
                new_question,
            }) => {
                state.ai_explanation = explanation;
                state.pending_question = new_question
                    .map(|q| q.into_retry_of(&asked))
                    .and_then(|q| match q.validate() {
                        Ok(()) => Some(q),
                        Err(e) => {
                            warn!("Ignoring generated question for block {}: {}", ticket.block_id, e);
                            None
                        }
                    });
                RemediationApplied::Explained {
                    has_retry_question: state.pending_question.is_some(),
                }
            }
            Ok(RemediationReply::Degraded {
                notice,
                explanation,
            }) => {
                state.ai_explanation = explanation;
                state.pending_question = None;
                RemediationApplied::Degraded { notice }
            }
            Err(e) => {
                warn!("Remediation failed for block {}: {}", ticket.block_id, e);
                state.ai_explanation = asked.explanation.clone();
                state.pending_question = None;
                RemediationApplied::Unavailable
            }
        };

        Some(applied)
    }

    pub fn retry(&mut self, block_id: &str) -> Result<(), QuizError> {
        self.ensure_interactive(block_id)?;
        let state = self
            .states
            .get_mut(block_id)
            .ok_or_else(|| QuizError::NothingToRetry(block_id.to_string()))?;
        if state.is_loading_ai {
            return Err(QuizError::RemediationInFlight(block_id.to_string()));
        }
        if !state.is_submitted || state.is_correct {
            return Err(QuizError::NothingToRetry(block_id.to_string()));
        }

        match state.pending_question.take() {
            Some(pending) => {
                *state = BlockState::default();
                self.active.insert(block_id.to_string(), pending);
            }
            None => {
                state.selected_answer = None;
                state.is_submitted = false;
                state.is_correct = false;
                state.ai_explanation.clear();
            }
        }
        Ok(())
    }

    /// Drops every outstanding remediation ticket. Late results are then
    /// discarded by [`TheoryEngine::apply_remediation`].
    pub fn abandon_remediations(&mut self) {
        for block_id in self.in_flight.keys() {
            if let Some(state) = self.states.get_mut(block_id) {
                state.is_loading_ai = false;
                state.ai_explanation = self
                    .active
                    .get(block_id)
                    .map(|q| q.explanation.clone())
                    .unwrap_or_default();
            }
        }
        self.in_flight.clear();
    }

    fn index_of(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }

    fn ensure_interactive(&self, block_id: &str) -> Result<usize, QuizError> {
        let index = self
            .index_of(block_id)
            .ok_or_else(|| QuizError::UnknownBlock(block_id.to_string()))?;
        if !self.is_unlocked(index) {
            return Err(QuizError::Locked(block_id.to_string()));
        }
        Ok(index)
    }
}
