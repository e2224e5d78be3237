use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use serde::Serialize;
use tokio::{sync::watch, time::Instant};

use crate::{
    api::{AttemptApi, QuizApi},
    auth::SessionContext,
    errors::{AppError, AppResult},
    models::{
        domain::{Quiz, QuizAttempt, QuizAttemptAnswer, QuizQuestion},
        dto::request::SubmitAnswersRequest,
    },
    services::countdown::Countdown,
};

/// Lifecycle of one attempt. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    Starting,
    InProgress,
    Finishing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    To(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running(u64),
    Expired,
    Inactive,
}

#[derive(Debug, Clone)]
struct SessionState {
    phase: SessionPhase,
    quiz: Option<Quiz>,
    questions: Vec<QuizQuestion>,
    attempt: Option<QuizAttempt>,
    current_index: usize,
    answers: HashMap<i64, BTreeSet<i64>>,
    visited: BTreeSet<i64>,
    remaining_secs: Option<u64>,
    started_at: Option<Instant>,
    result: Option<QuizAttempt>,
    last_error: Option<AppError>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            quiz: None,
            questions: Vec::new(),
            attempt: None,
            current_index: 0,
            answers: HashMap::new(),
            visited: BTreeSet::new(),
            remaining_secs: None,
            started_at: None,
            result: None,
            last_error: None,
        }
    }

    fn require_phase(&self, expected: SessionPhase, action: &str) -> AppResult<()> {
        if self.phase != expected {
            return Err(AppError::InvalidState(format!(
                "cannot {} while the session is {:?}",
                action, self.phase
            )));
        }
        Ok(())
    }

    fn question(&self, question_id: i64) -> AppResult<&QuizQuestion> {
        self.questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Question {} is not part of this quiz",
                    question_id
                ))
            })
    }
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub quiz: Option<Quiz>,
    pub attempt: Option<QuizAttempt>,
    pub question_count: usize,
    pub current_index: usize,
    pub current_question: Option<QuizQuestion>,
    pub answers: BTreeMap<i64, Vec<i64>>,
    pub visited: BTreeSet<i64>,
    pub remaining_secs: Option<u64>,
    pub elapsed_secs: u64,
    pub result: Option<QuizAttempt>,
    #[serde(skip)]
    pub last_error: Option<AppError>,
}

/// Client-side controller for one quiz attempt, from start to submission.
///
/// Shared as `Arc<AttemptSession>`; the countdown task only holds a weak handle.
/// State lives behind a mutex that is never held across an await point, and every
/// async result is dropped if [`AttemptSession::dispose`] ran while it was in flight.
pub struct AttemptSession {
    quiz_api: Arc<dyn QuizApi>,
    attempt_api: Arc<dyn AttemptApi>,
    context: Arc<SessionContext>,
    state: Mutex<SessionState>,
    countdown: Mutex<Option<Countdown>>,
    disposed: AtomicBool,
    phase_tx: watch::Sender<SessionPhase>,
}

impl AttemptSession {
    pub fn new(
        quiz_api: Arc<dyn QuizApi>,
        attempt_api: Arc<dyn AttemptApi>,
        context: Arc<SessionContext>,
    ) -> Arc<Self> {
        Self::with_state(quiz_api, attempt_api, context, SessionState::idle())
    }

    fn with_state(
        quiz_api: Arc<dyn QuizApi>,
        attempt_api: Arc<dyn AttemptApi>,
        context: Arc<SessionContext>,
        state: SessionState,
    ) -> Arc<Self> {
        let (phase_tx, _) = watch::channel(state.phase);
        Arc::new(Self {
            quiz_api,
            attempt_api,
            context,
            state: Mutex::new(state),
            countdown: Mutex::new(None),
            disposed: AtomicBool::new(false),
            phase_tx,
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalError("session state lock poisoned".to_string()))
    }

    fn set_phase(&self, state: &mut SessionState, phase: SessionPhase) {
        log::debug!("Session phase {:?} -> {:?}", state.phase, phase);
        state.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    fn ensure_live(&self) -> AppResult<()> {
        if self.is_disposed() {
            return Err(AppError::SessionDisposed);
        }
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Loads the quiz and its questions, then opens the attempt on the service.
    pub async fn start(self: &Arc<Self>, quiz_id: i64, access_key: Option<String>) -> AppResult<()> {
        self.ensure_live()?;
        {
            let mut state = self.lock()?;
            state.require_phase(SessionPhase::Idle, "start")?;
            self.set_phase(&mut state, SessionPhase::Starting);
        }

        log::info!("Starting attempt for quiz {}", quiz_id);
        let loaded = self.load(quiz_id, access_key).await;

        if self.is_disposed() {
            log::warn!("Discarding start result for quiz {}: session disposed", quiz_id);
            return Err(AppError::SessionDisposed);
        }

        let (quiz, questions, attempt) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                log::error!("Could not start quiz {}: {}", quiz_id, err);
                let mut state = self.lock()?;
                state.last_error = Some(err.clone());
                self.set_phase(&mut state, SessionPhase::Failed);
                return Err(err);
            }
        };

        if let Some(guest) = attempt.guest_session_id.as_deref() {
            if let Err(err) = self.context.set_guest_session_id(guest) {
                log::warn!("Could not store guest session id: {}", err);
            }
        }

        let timed = {
            let mut state = self.lock()?;
            state.remaining_secs = quiz.countdown_secs();
            state.quiz = Some(quiz);
            state.questions = questions;
            state.attempt = Some(attempt);
            state.current_index = 0;
            state.answers.clear();
            state.visited.clear();
            state.started_at = Some(Instant::now());
            self.set_phase(&mut state, SessionPhase::InProgress);
            state.remaining_secs.is_some()
        };

        if timed {
            self.start_countdown();
        }

        Ok(())
    }

    // Metadata first: a private quiz's access key is only meaningful once the quiz resolves.
    async fn load(
        &self,
        quiz_id: i64,
        access_key: Option<String>,
    ) -> AppResult<(Quiz, Vec<QuizQuestion>, QuizAttempt)> {
        let quiz = self.quiz_api.get_quiz(quiz_id).await?;
        let questions = self.quiz_api.get_questions(quiz_id, access_key).await?;

        if questions.is_empty() {
            return Err(AppError::ValidationError("Quiz has no questions".to_string()));
        }

        self.ensure_live()?;
        let attempt = self.attempt_api.start_attempt(quiz_id).await?;
        Ok((quiz, questions, attempt))
    }

    /// Overwrites the chosen options for a question. Cardinality is left to the caller.
    pub fn record_answer(&self, question_id: i64, option_ids: &[i64]) -> AppResult<()> {
        let mut state = self.lock()?;
        state.require_phase(SessionPhase::InProgress, "record an answer")?;

        let question = state.question(question_id)?;
        if let Some(unknown) = option_ids.iter().find(|id| !question.has_option(**id)) {
            return Err(AppError::ValidationError(format!(
                "Option {} does not belong to question {}",
                unknown, question_id
            )));
        }

        state
            .answers
            .insert(question_id, option_ids.iter().copied().collect());
        Ok(())
    }

    pub fn mark_visited(&self, question_id: i64) -> AppResult<()> {
        let mut state = self.lock()?;
        state.require_phase(SessionPhase::InProgress, "mark a question visited")?;
        state.question(question_id)?;
        state.visited.insert(question_id);
        Ok(())
    }

    /// Moves the cursor and returns its new position. Out-of-range moves change nothing.
    pub fn navigate(&self, navigation: Navigation) -> AppResult<usize> {
        let mut state = self.lock()?;
        state.require_phase(SessionPhase::InProgress, "navigate")?;

        let current = state.current_index;
        let target = match navigation {
            Navigation::Next => current.checked_add(1),
            Navigation::Previous => current.checked_sub(1),
            Navigation::To(index) => Some(index),
        };

        match target {
            Some(index) if index < state.questions.len() && index != current => {
                let leaving = state.questions[current].id;
                state.visited.insert(leaving);
                state.current_index = index;
                Ok(index)
            }
            _ => Ok(current),
        }
    }

    /// One countdown step. Public so the timer can be driven without wall-clock time.
    pub fn tick(&self) -> TickOutcome {
        let Ok(mut state) = self.lock() else {
            return TickOutcome::Inactive;
        };

        if state.phase != SessionPhase::InProgress {
            return TickOutcome::Inactive;
        }

        match state.remaining_secs {
            Some(remaining) if remaining > 0 => {
                let remaining = remaining - 1;
                state.remaining_secs = Some(remaining);
                if remaining == 0 {
                    TickOutcome::Expired
                } else {
                    TickOutcome::Running(remaining)
                }
            }
            _ => TickOutcome::Inactive,
        }
    }

    /// Submits one entry per question and returns the scored attempt.
    ///
    /// Only the first caller gets past the `InProgress -> Finishing` guard, so an
    /// expiring countdown and a manual finish never both submit.
    pub async fn finish(&self) -> AppResult<QuizAttempt> {
        let (attempt_id, request) = {
            let mut state = self.lock()?;
            state.require_phase(SessionPhase::InProgress, "finish")?;
            let attempt_id = state
                .attempt
                .as_ref()
                .map(|a| a.id)
                .ok_or_else(|| AppError::InternalError("attempt missing".to_string()))?;
            let request = Self::build_submission(&state.questions, &state.answers);
            self.set_phase(&mut state, SessionPhase::Finishing);
            (attempt_id, request)
        };

        self.stop_countdown();

        log::info!(
            "Submitting attempt {} with {} answers",
            attempt_id,
            request.answers.len()
        );
        let outcome = self.attempt_api.stop_attempt(attempt_id, &request).await;

        if self.is_disposed() {
            log::warn!("Discarding submission result for attempt {}: session disposed", attempt_id);
            return Err(AppError::SessionDisposed);
        }

        let mut state = self.lock()?;
        match outcome {
            Ok(result) => {
                log::info!(
                    "Attempt {} completed with score {:?}",
                    attempt_id,
                    result.score
                );
                state.result = Some(result.clone());
                state.last_error = None;
                self.set_phase(&mut state, SessionPhase::Completed);
                Ok(result)
            }
            Err(err) => {
                log::error!("Submitting attempt {} failed: {}", attempt_id, err);
                state.last_error = Some(err.clone());
                self.set_phase(&mut state, SessionPhase::Failed);
                Err(err)
            }
        }
    }

    /// Like [`AttemptSession::finish`], but when a submission is already in flight
    /// (an expired countdown, say) waits for it and returns its outcome instead.
    pub async fn finish_or_join(&self) -> AppResult<QuizAttempt> {
        match self.finish().await {
            Err(AppError::InvalidState(_))
                if matches!(self.phase(), SessionPhase::Finishing | SessionPhase::Completed) =>
            {
                self.settled().await
            }
            outcome => outcome,
        }
    }

    async fn settled(&self) -> AppResult<QuizAttempt> {
        let mut phases = self.subscribe();
        let terminal = phases
            .wait_for(|phase| {
                self.is_disposed()
                    || matches!(phase, SessionPhase::Completed | SessionPhase::Failed)
            })
            .await
            .is_ok();

        if !terminal || self.is_disposed() {
            return Err(AppError::SessionDisposed);
        }

        let state = self.lock()?;
        match (&state.result, &state.last_error) {
            (Some(result), _) if state.phase == SessionPhase::Completed => Ok(result.clone()),
            (_, Some(err)) => Err(err.clone()),
            _ => Err(AppError::InternalError(
                "submission settled without an outcome".to_string(),
            )),
        }
    }

    /// Payload for `/stop`: every question in quiz order, unanswered ones with an empty list.
    pub fn build_submission(
        questions: &[QuizQuestion],
        answers: &HashMap<i64, BTreeSet<i64>>,
    ) -> SubmitAnswersRequest {
        SubmitAnswersRequest {
            answers: questions
                .iter()
                .map(|q| QuizAttemptAnswer {
                    question_id: q.id,
                    selected_option_ids: answers
                        .get(&q.id)
                        .map(|ids| ids.iter().copied().collect())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// Builds a fresh session that resubmits a failed attempt without losing answers.
    pub fn retry(&self) -> AppResult<Arc<AttemptSession>> {
        self.ensure_live()?;
        let state = {
            let state = self.lock()?;
            state.require_phase(SessionPhase::Failed, "retry")?;
            if state.attempt.is_none() {
                return Err(AppError::InvalidState(
                    "the attempt never started; start a new session instead".to_string(),
                ));
            }

            let mut next = state.clone();
            next.phase = SessionPhase::InProgress;
            next.last_error = None;
            next
        };

        let timed = state.remaining_secs.is_some_and(|r| r > 0);
        let session = Self::with_state(
            self.quiz_api.clone(),
            self.attempt_api.clone(),
            self.context.clone(),
            state,
        );
        if timed {
            session.start_countdown();
        }

        log::info!("Retrying submission in a new session");
        Ok(session)
    }

    /// Tears the session down: stops the timer and ignores any response still in flight.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            log::debug!("Session disposed");
        }
        self.stop_countdown();
        // wakes anyone waiting on a submission that will now never settle
        self.phase_tx.send_modify(|_| {});
    }

    fn start_countdown(self: &Arc<Self>) {
        let countdown = Countdown::spawn(Arc::downgrade(self));
        if let Ok(mut slot) = self.countdown.lock() {
            *slot = Some(countdown);
        }
    }

    fn stop_countdown(&self) {
        let stopped = self.countdown.lock().ok().and_then(|mut slot| slot.take());
        drop(stopped);
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown
            .lock()
            .map(|slot| slot.as_ref().is_some_and(Countdown::is_running))
            .unwrap_or(false)
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase_tx.borrow()
    }

    /// Receiver that observes every phase change, including automatic submission.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    pub fn snapshot(&self) -> AppResult<SessionSnapshot> {
        let state = self.lock()?;

        Ok(SessionSnapshot {
            phase: state.phase,
            quiz: state.quiz.clone(),
            attempt: state.attempt.clone(),
            question_count: state.questions.len(),
            current_index: state.current_index,
            current_question: state.questions.get(state.current_index).cloned(),
            answers: state
                .answers
                .iter()
                .map(|(id, options)| (*id, options.iter().copied().collect()))
                .collect(),
            visited: state.visited.clone(),
            remaining_secs: state.remaining_secs,
            elapsed_secs: state
                .started_at
                .map(|started| started.elapsed().as_secs())
                .unwrap_or(0),
            result: state.result.clone(),
            last_error: state.last_error.clone(),
        })
    }

    pub fn questions(&self) -> AppResult<Vec<QuizQuestion>> {
        Ok(self.lock()?.questions.clone())
    }
}
