use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::quiz::ai_helper::{RemediationError, Remediator, DEFAULT_TIMEOUT};
use crate::quiz::engine::{RemediationApplied, SubmitOutcome, TheoryEngine};
use crate::quiz::QuizError;

/// What the presentation layer should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ScrollTo(String),
    TopicCompleted,
    RemediationReady {
        block_id: String,
        has_retry_question: bool,
    },
    RemediationDegraded {
        block_id: String,
        notice: String,
    },
    RemediationUnavailable(String),
}

/// A theory section that is currently open. Remediation calls run as tasks
/// owned by the session; dropping the session aborts them.
pub struct TheorySession<R> {
    engine: Arc<Mutex<TheoryEngine>>,
    remediator: Arc<R>,
    tasks: JoinSet<()>,
    events: mpsc::UnboundedSender<SessionEvent>,
    timeout: Duration,
}

impl<R: Remediator + 'static> TheorySession<R> {
    pub fn new(
        engine: TheoryEngine,
        remediator: Arc<R>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            engine: Arc::new(Mutex::new(engine)),
            remediator,
            tasks: JoinSet::new(),
            events,
            timeout: DEFAULT_TIMEOUT,
        };
        (session, rx)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_engine<T>(&self, f: impl FnOnce(&TheoryEngine) -> T) -> T {
        let engine = lock(&self.engine);
        f(&*engine)
    }

    pub fn select_answer(&self, block_id: &str, option_id: &str) -> Result<(), QuizError> {
        lock(&self.engine).select_answer(block_id, option_id)
    }

    pub fn retry(&self, block_id: &str) -> Result<(), QuizError> {
        lock(&self.engine).retry(block_id)
    }

    /// Submits the selected answer. A wrong answer starts a remediation call
    /// in the background; its result arrives as a [`SessionEvent`].
    pub fn submit(&mut self, block_id: &str) -> Result<SubmitOutcome, QuizError> {
        let outcome = lock(&self.engine).submit(block_id)?;

        match &outcome {
            SubmitOutcome::Correct {
                next_block,
                topic_completed,
            } => {
                if let Some(next) = next_block {
                    let _ = self.events.send(SessionEvent::ScrollTo(next.clone()));
                }
                if *topic_completed {
                    info!("Topic {} completed", lock(&self.engine).topic());
                    let _ = self.events.send(SessionEvent::TopicCompleted);
                }
            }
            SubmitOutcome::Incorrect(ticket) => {
                let ticket = ticket.clone();
                let engine = self.engine.clone();
                let remediator = self.remediator.clone();
                let events = self.events.clone();
                let timeout = self.timeout;

                self.tasks.spawn(async move {
                    let result =
                        match tokio::time::timeout(timeout, remediator.remediate(&ticket.request))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(RemediationError::TimedOut(timeout)),
                        };

                    let applied = lock(&engine).apply_remediation(&ticket, result);
                    let event = match applied {
                        Some(RemediationApplied::Explained { has_retry_question }) => {
                            SessionEvent::RemediationReady {
                                block_id: ticket.block_id,
                                has_retry_question,
                            }
                        }
                        Some(RemediationApplied::Degraded { notice }) => {
                            SessionEvent::RemediationDegraded {
                                block_id: ticket.block_id,
                                notice,
                            }
                        }
                        Some(RemediationApplied::Unavailable) => {
                            SessionEvent::RemediationUnavailable(ticket.block_id)
                        }
                        None => return,
                    };
                    let _ = events.send(event);
                });
            }
        }

        Ok(outcome)
    }

    /// Waits until every remediation call started so far has been applied.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    warn!("Remediation task failed: {}", e);
                }
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Tears the session down, cancelling outstanding remediation calls.
    pub fn close(mut self) -> TheoryEngine {
        self.tasks.abort_all();
        let mut engine = lock(&self.engine);
        engine.abandon_remediations();
        engine.clone()
    }
}

impl<R> Drop for TheorySession<R> {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

/// A panicking remediation task must not wedge the session.
fn lock(engine: &Mutex<TheoryEngine>) -> MutexGuard<'_, TheoryEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ai_helper::{GeneratedQuestion, RemediationReply, RemediationRequest};
    use crate::quiz::bank::Topic;
    use crate::quiz::{Answer, Question, TheoryBlock};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Script {
        Replace,
        Explain,
        Fail,
        Hang,
    }

    struct FakeRemediator {
        script: Script,
        calls: AtomicUsize,
    }

    impl FakeRemediator {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Remediator for FakeRemediator {
        async fn remediate(
            &self,
            request: &RemediationRequest,
        ) -> Result<RemediationReply, RemediationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Replace => Ok(RemediationReply::Explained {
                    explanation: format!("About: {}", request.question),
                    new_question: Some(GeneratedQuestion {
                        question: "Replacement?".to_string(),
                        options: vec![
                            Answer::new("x", "right", true),
                            Answer::new("y", "wrong", false),
                        ],
                    }),
                }),
                Script::Explain => Ok(RemediationReply::Explained {
                    explanation: "Try again".to_string(),
                    new_question: None,
                }),
                Script::Fail => Err(RemediationError::Status(500)),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(RemediationError::Status(504))
                }
            }
        }
    }

    fn engine() -> TheoryEngine {
        let block = |id: &str| {
            TheoryBlock::new(
                id,
                id,
                "",
                Question::new(
                    &format!("q{}", id),
                    &format!("Question {}?", id),
                    vec![Answer::new("a", "no", false), Answer::new("b", "yes", true)],
                    &format!("Because {}", id),
                ),
            )
        };
        TheoryEngine::new(Topic::BubbleSort, vec![block("A"), block("B"), block("C")]).unwrap()
    }

    #[tokio::test]
    async fn end_to_end_with_replacement_question() {
        let remediator = FakeRemediator::new(Script::Replace);
        let (mut session, mut events) = TheorySession::new(engine(), remediator.clone());

        session.select_answer("A", "a").unwrap();
        assert!(matches!(
            session.submit("A").unwrap(),
            SubmitOutcome::Incorrect(_)
        ));
        session.settle().await;

        assert_eq!(
            events.recv().await,
            Some(SessionEvent::RemediationReady {
                block_id: "A".to_string(),
                has_retry_question: true
            })
        );
        let state = session.with_engine(|e| e.block_state("A"));
        assert_eq!(state.ai_explanation, "About: Question A?");
        assert!(!state.is_loading_ai);

        session.retry("A").unwrap();
        session.select_answer("A", "x").unwrap();
        session.submit("A").unwrap();

        assert_eq!(events.recv().await, Some(SessionEvent::ScrollTo("B".to_string())));
        assert!(session.with_engine(|e| e.is_completed("A") && e.is_unlocked(1)));
        assert_eq!(remediator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_surfaces_as_unavailable() {
        let (mut session, mut events) =
            TheorySession::new(engine(), FakeRemediator::new(Script::Fail));

        session.select_answer("A", "a").unwrap();
        session.submit("A").unwrap();
        session.settle().await;

        assert_eq!(
            events.recv().await,
            Some(SessionEvent::RemediationUnavailable("A".to_string()))
        );
        let state = session.with_engine(|e| e.block_state("A"));
        assert_eq!(state.ai_explanation, "Because A");
        assert!(state.pending_question.is_none());
        assert!(!state.is_loading_ai);
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let (session, mut events) =
            TheorySession::new(engine(), FakeRemediator::new(Script::Hang));
        let mut session = session.with_timeout(Duration::from_millis(20));

        session.select_answer("A", "a").unwrap();
        session.submit("A").unwrap();
        session.settle().await;

        assert_eq!(
            events.recv().await,
            Some(SessionEvent::RemediationUnavailable("A".to_string()))
        );
        assert_eq!(
            session.with_engine(|e| e.block_state("A").ai_explanation),
            "Because A"
        );
    }

    #[tokio::test]
    async fn closing_cancels_outstanding_calls() {
        let (mut session, mut events) =
            TheorySession::new(engine(), FakeRemediator::new(Script::Hang));

        session.select_answer("A", "a").unwrap();
        session.submit("A").unwrap();
        assert_eq!(session.in_flight(), 1);

        let engine = session.close();
        let state = engine.block_state("A");
        assert!(!state.is_loading_ai);
        assert!(state.is_submitted && !state.is_correct);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn completing_the_topic_is_announced_once() {
        let (mut session, mut events) =
            TheorySession::new(engine(), FakeRemediator::new(Script::Explain));

        for id in ["A", "B"] {
            session.select_answer(id, "b").unwrap();
            session.submit(id).unwrap();
        }
        session.select_answer("C", "a").unwrap();
        session.submit("C").unwrap();
        session.settle().await;
        session.retry("C").unwrap();
        session.select_answer("C", "b").unwrap();
        session.submit("C").unwrap();
        assert!(session.submit("C").is_err());
        drop(session);

        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                SessionEvent::ScrollTo("B".to_string()),
                SessionEvent::ScrollTo("C".to_string()),
                SessionEvent::RemediationReady {
                    block_id: "C".to_string(),
                    has_retry_question: false
                },
                SessionEvent::TopicCompleted,
            ]
        );
    }
}
