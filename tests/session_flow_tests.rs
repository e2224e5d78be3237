use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Notify, RwLock};

use quiz_client::{
    api::{AttemptApi, QuizApi},
    auth::{MemoryCredentialStore, SessionContext},
    errors::{AppError, AppResult, RecoveryAction},
    models::{
        domain::{
            Quiz, QuizAttempt, QuizAttemptAnswer, QuizQuestion, QuizQuestionOption,
            QuizQuestionType, TimeLimit,
        },
        dto::{
            request::{QuestionRequest, QuizListQuery, QuizRequest, SubmitAnswersRequest},
            response::LeaderboardEntry,
        },
    },
    services::{AttemptSession, Navigation, QuestionStatus, ResultService, SessionPhase},
};

/// Quiz service kept in memory. Scores an attempt the way the real service does:
/// a question counts when the chosen options equal the correct ones.
struct InMemoryQuizService {
    quizzes: RwLock<HashMap<i64, Quiz>>,
    questions: RwLock<HashMap<i64, Vec<QuizQuestion>>>,
    access_keys: RwLock<HashMap<i64, String>>,
    attempts: RwLock<HashMap<i64, QuizAttempt>>,
    answers: RwLock<HashMap<i64, Vec<QuizAttemptAnswer>>>,
    next_attempt_id: AtomicI64,
    stop_calls: AtomicUsize,
    stop_gate: Option<Arc<Notify>>,
}

impl InMemoryQuizService {
    fn new() -> Self {
        Self {
            quizzes: RwLock::new(HashMap::new()),
            questions: RwLock::new(HashMap::new()),
            access_keys: RwLock::new(HashMap::new()),
            attempts: RwLock::new(HashMap::new()),
            answers: RwLock::new(HashMap::new()),
            next_attempt_id: AtomicI64::new(100),
            stop_calls: AtomicUsize::new(0),
            stop_gate: None,
        }
    }

    // Holds every `/stop` response until the gate is notified.
    fn with_stop_gate(mut self, gate: Arc<Notify>) -> Self {
        self.stop_gate = Some(gate);
        self
    }

    async fn add_quiz(&self, quiz: Quiz, questions: Vec<QuizQuestion>) {
        self.questions.write().await.insert(quiz.id, questions);
        self.quizzes.write().await.insert(quiz.id, quiz);
    }

    async fn set_access_key(&self, quiz_id: i64, key: &str) {
        self.access_keys
            .write()
            .await
            .insert(quiz_id, key.to_string());
    }

    fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    async fn stored_answers(&self, attempt_id: i64) -> Vec<QuizAttemptAnswer> {
        self.answers
            .read()
            .await
            .get(&attempt_id)
            .cloned()
            .unwrap_or_default()
    }

    fn score(questions: &[QuizQuestion], answers: &[QuizAttemptAnswer]) -> f64 {
        if questions.is_empty() {
            return 0.0;
        }

        let correct = questions
            .iter()
            .filter(|question| {
                let expected: BTreeSet<i64> = question
                    .options
                    .iter()
                    .filter(|o| o.is_correct == Some(true))
                    .map(|o| o.id)
                    .collect();
                answers
                    .iter()
                    .find(|a| a.question_id == question.id)
                    .is_some_and(|a| {
                        a.selected_option_ids.iter().copied().collect::<BTreeSet<_>>() == expected
                    })
            })
            .count();

        correct as f64 * 100.0 / questions.len() as f64
    }
}

#[async_trait]
impl QuizApi for InMemoryQuizService {
    async fn list_quizzes(&self, query: &QuizListQuery) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<Quiz> = quizzes
            .values()
            .filter(|q| query.category.is_none() || q.category == query.category)
            .cloned()
            .collect();
        items.sort_by_key(|q| q.id);
        Ok(items)
    }

    async fn get_quiz(&self, quiz_id: i64) -> AppResult<Quiz> {
        self.quizzes
            .read()
            .await
            .get(&quiz_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))
    }

    async fn create_quiz(&self, _request: &QuizRequest) -> AppResult<Quiz> {
        Err(AppError::Forbidden("read-only service".to_string()))
    }

    async fn update_quiz(&self, _quiz_id: i64, _request: &QuizRequest) -> AppResult<Quiz> {
        Err(AppError::Forbidden("read-only service".to_string()))
    }

    async fn delete_quiz(&self, _quiz_id: i64) -> AppResult<()> {
        Err(AppError::Forbidden("read-only service".to_string()))
    }

    async fn get_questions(
        &self,
        quiz_id: i64,
        access_key: Option<String>,
    ) -> AppResult<Vec<QuizQuestion>> {
        let quiz = self.get_quiz(quiz_id).await?;
        if !quiz.is_public {
            let expected = self.access_keys.read().await.get(&quiz_id).cloned();
            if expected.is_none() || expected != access_key {
                return Err(AppError::Forbidden("Access key required".to_string()));
            }
        }

        Ok(self
            .questions
            .read()
            .await
            .get(&quiz_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_question(&self, _request: &QuestionRequest) -> AppResult<QuizQuestion> {
        Err(AppError::Forbidden("read-only service".to_string()))
    }

    async fn update_question(
        &self,
        _question_id: i64,
        _request: &QuestionRequest,
    ) -> AppResult<QuizQuestion> {
        Err(AppError::Forbidden("read-only service".to_string()))
    }

    async fn delete_question(&self, _question_id: i64) -> AppResult<()> {
        Err(AppError::Forbidden("read-only service".to_string()))
    }
}

#[async_trait]
impl AttemptApi for InMemoryQuizService {
    async fn start_attempt(&self, quiz_id: i64) -> AppResult<QuizAttempt> {
        self.get_quiz(quiz_id).await?;

        let id = self.next_attempt_id.fetch_add(1, Ordering::SeqCst);
        let attempt = QuizAttempt {
            id,
            quiz_id,
            user_id: None,
            guest_session_id: Some(format!("guest-{}", id)),
            started_at: Some(Utc::now()),
            completed_at: None,
            time_taken: None,
            score: None,
        };
        self.attempts.write().await.insert(id, attempt.clone());
        Ok(attempt)
    }

    async fn stop_attempt(
        &self,
        attempt_id: i64,
        request: &SubmitAnswersRequest,
    ) -> AppResult<QuizAttempt> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.stop_gate {
            gate.notified().await;
        }

        let mut attempts = self.attempts.write().await;
        let attempt = attempts
            .get_mut(&attempt_id)
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))?;
        if attempt.is_completed() {
            return Err(AppError::ValidationError(
                "Attempt already completed".to_string(),
            ));
        }

        let questions = self
            .questions
            .read()
            .await
            .get(&attempt.quiz_id)
            .cloned()
            .unwrap_or_default();
        attempt.score = Some(Self::score(&questions, &request.answers));
        attempt.completed_at = Some(Utc::now());
        attempt.time_taken = Some(TimeLimit::from_secs(42));

        self.answers
            .write()
            .await
            .insert(attempt_id, request.answers.clone());
        Ok(attempt.clone())
    }

    async fn get_attempt(&self, attempt_id: i64) -> AppResult<QuizAttempt> {
        self.attempts
            .read()
            .await
            .get(&attempt_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))
    }

    async fn get_attempt_answers(&self, attempt_id: i64) -> AppResult<Vec<QuizAttemptAnswer>> {
        Ok(self.stored_answers(attempt_id).await)
    }

    async fn get_leaderboard(&self, quiz_id: i64) -> AppResult<Vec<LeaderboardEntry>> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.is_completed())
            .map(|a| LeaderboardEntry {
                username: a.guest_session_id.clone().unwrap_or_default(),
                score: a.score.unwrap_or(0.0),
                time_taken: a.time_taken,
            })
            .collect())
    }
}

fn quiz(id: i64, time_limit: Option<&str>, is_public: bool) -> Quiz {
    Quiz {
        id,
        title: format!("Quiz {}", id),
        description: String::new(),
        is_public,
        time_limit: time_limit.map(|t| t.parse().expect("valid time limit")),
        category: Some("general".to_string()),
        author_id: Some(1),
        created_at: None,
    }
}

/// Single-choice questions whose first option is the correct one.
fn questions(quiz_id: i64, count: i64) -> Vec<QuizQuestion> {
    (1..=count)
        .map(|id| QuizQuestion {
            id,
            quiz_id,
            text: format!("Question {}", id),
            question_type: QuizQuestionType::SingleChoice,
            options: (1..=3)
                .map(|n| QuizQuestionOption {
                    id: id * 10 + n,
                    text: format!("Option {}", n),
                    is_correct: Some(n == 1),
                })
                .collect(),
        })
        .collect()
}

fn new_session(service: &Arc<InMemoryQuizService>) -> (Arc<AttemptSession>, Arc<SessionContext>) {
    let store = Arc::new(MemoryCredentialStore::default());
    let context = Arc::new(SessionContext::new(store).expect("context"));
    let quiz_api: Arc<dyn QuizApi> = service.clone();
    let attempt_api: Arc<dyn AttemptApi> = service.clone();
    (
        AttemptSession::new(quiz_api, attempt_api, context.clone()),
        context,
    )
}

#[tokio::test]
async fn test_guest_takes_a_quiz_from_start_to_score() {
    let service = Arc::new(InMemoryQuizService::new());
    service.add_quiz(quiz(1, None, true), questions(1, 2)).await;
    let (session, context) = new_session(&service);

    session.start(1, None).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::InProgress);
    assert!(!session.countdown_running());

    let attempt_id = session.snapshot().unwrap().attempt.unwrap().id;
    assert_eq!(
        context.guest_session_id(),
        Some(format!("guest-{}", attempt_id))
    );

    session.record_answer(1, &[11]).unwrap();
    assert_eq!(session.navigate(Navigation::Next).unwrap(), 1);
    assert_eq!(session.navigate(Navigation::Next).unwrap(), 1);

    let result = session.finish().await.unwrap();

    assert_eq!(result.score, Some(50.0));
    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(
        service.stored_answers(attempt_id).await,
        vec![
            QuizAttemptAnswer {
                question_id: 1,
                selected_option_ids: vec![11],
            },
            QuizAttemptAnswer {
                question_id: 2,
                selected_option_ids: vec![],
            },
        ]
    );
}

#[tokio::test]
async fn test_private_quiz_needs_its_access_key() {
    let service = Arc::new(InMemoryQuizService::new());
    service.add_quiz(quiz(2, None, false), questions(2, 1)).await;
    service.set_access_key(2, "s3cret").await;

    let (denied, _) = new_session(&service);
    let err = denied.start(2, None).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(err.recovery(), RecoveryAction::ProvideAccessKey);
    assert_eq!(denied.phase(), SessionPhase::Failed);

    let (allowed, _) = new_session(&service);
    allowed.start(2, Some("s3cret".to_string())).await.unwrap();
    assert_eq!(allowed.phase(), SessionPhase::InProgress);
}

#[tokio::test]
async fn test_response_arriving_after_dispose_is_discarded() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(InMemoryQuizService::new().with_stop_gate(gate.clone()));
    service.add_quiz(quiz(3, None, true), questions(3, 2)).await;
    let (session, _) = new_session(&service);
    session.start(3, None).await.unwrap();

    let finishing = tokio::spawn({
        let session = session.clone();
        async move { session.finish().await }
    });

    let mut phases = session.subscribe();
    phases
        .wait_for(|phase| *phase == SessionPhase::Finishing)
        .await
        .unwrap();
    session.dispose();
    gate.notify_one();

    assert_eq!(finishing.await.unwrap(), Err(AppError::SessionDisposed));
    assert_ne!(session.phase(), SessionPhase::Completed);
    assert!(session.snapshot().unwrap().result.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_timed_quiz_submits_itself_when_time_runs_out() {
    let service = Arc::new(InMemoryQuizService::new());
    service
        .add_quiz(quiz(4, Some("00:00:03"), true), questions(4, 2))
        .await;
    let (session, _) = new_session(&service);

    session.start(4, None).await.unwrap();
    assert!(session.countdown_running());
    session.record_answer(2, &[21]).unwrap();

    let mut phases = session.subscribe();
    phases
        .wait_for(|phase| *phase == SessionPhase::Completed)
        .await
        .unwrap();

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.remaining_secs, Some(0));
    assert_eq!(snapshot.result.and_then(|r| r.score), Some(50.0));
    assert_eq!(service.stop_calls(), 1);
    assert!(!session.countdown_running());
}

#[tokio::test(start_paused = true)]
async fn test_manual_finish_beats_the_countdown() {
    let service = Arc::new(InMemoryQuizService::new());
    service
        .add_quiz(quiz(5, Some("00:00:05"), true), questions(5, 1))
        .await;
    let (session, _) = new_session(&service);
    session.start(5, None).await.unwrap();

    session.finish().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    assert_eq!(service.stop_calls(), 1);
    assert_eq!(session.phase(), SessionPhase::Completed);
}

#[tokio::test]
async fn test_finished_attempt_can_be_reviewed_and_ranked() {
    let service = Arc::new(InMemoryQuizService::new());
    service.add_quiz(quiz(6, None, true), questions(6, 2)).await;

    let (first, _) = new_session(&service);
    first.start(6, None).await.unwrap();
    first.record_answer(1, &[11]).unwrap();
    first.record_answer(2, &[21]).unwrap();
    let best = first.finish().await.unwrap();

    let (second, _) = new_session(&service);
    second.start(6, None).await.unwrap();
    second.record_answer(1, &[12]).unwrap();
    second.finish().await.unwrap();

    let quiz_api: Arc<dyn QuizApi> = service.clone();
    let attempt_api: Arc<dyn AttemptApi> = service.clone();
    let results = ResultService::new(quiz_api, attempt_api);

    let review = results.review(best.id, None).await.unwrap();
    assert_eq!(review.count_with_status(QuestionStatus::Correct), 2);

    let board = results.leaderboard(6).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].entry.score, 100.0);
    assert_eq!(board[1].entry.score, 0.0);
}

#[tokio::test]
async fn test_finish_during_inflight_submission_joins_it() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(InMemoryQuizService::new().with_stop_gate(gate.clone()));
    service.add_quiz(quiz(7, None, true), questions(7, 2)).await;
    let (session, _) = new_session(&service);
    session.start(7, None).await.unwrap();
    session.record_answer(1, &[11]).unwrap();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.finish().await }
    });
    let mut phases = session.subscribe();
    phases
        .wait_for(|phase| *phase == SessionPhase::Finishing)
        .await
        .unwrap();

    let second = tokio::spawn({
        let session = session.clone();
        async move { session.finish_or_join().await }
    });
    tokio::task::yield_now().await;
    gate.notify_one();

    let submitted = first.await.unwrap().unwrap();
    let joined = second.await.unwrap().unwrap();

    assert_eq!(joined, submitted);
    assert_eq!(joined.score, Some(50.0));
    assert_eq!(service.stop_calls(), 1);
    assert_eq!(session.phase(), SessionPhase::Completed);
}

#[tokio::test]
async fn test_joined_submission_ends_when_session_is_disposed() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(InMemoryQuizService::new().with_stop_gate(gate.clone()));
    service.add_quiz(quiz(8, None, true), questions(8, 1)).await;
    let (session, _) = new_session(&service);
    session.start(8, None).await.unwrap();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.finish().await }
    });
    let mut phases = session.subscribe();
    phases
        .wait_for(|phase| *phase == SessionPhase::Finishing)
        .await
        .unwrap();

    let joining = tokio::spawn({
        let session = session.clone();
        async move { session.finish_or_join().await }
    });
    tokio::task::yield_now().await;
    session.dispose();

    assert_eq!(joining.await.unwrap(), Err(AppError::SessionDisposed));
    gate.notify_one();
    assert_eq!(first.await.unwrap(), Err(AppError::SessionDisposed));
}
