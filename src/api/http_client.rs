use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    api::{status::error_for_status, AttemptApi, QuizApi, UserApi},
    auth::SessionContext,
    config::Config,
    errors::AppResult,
    models::{
        domain::{Quiz, QuizAttempt, QuizAttemptAnswer, QuizQuestion, User},
        dto::{
            request::{
                LoginRequest, QuestionRequest, QuizListQuery, QuizRequest, RegisterRequest,
                SubmitAnswersRequest,
            },
            response::{AuthResponse, LeaderboardEntry},
        },
    },
};

/// `reqwest` implementation of every API trait against one base URL.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    context: Arc<SessionContext>,
}

impl HttpApiClient {
    pub fn new(config: &Config, context: Arc<SessionContext>) -> AppResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            context,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        log::debug!("{} {} [request {}]", method, path, request_id);

        let builder = self
            .client
            .request(method, self.url(path))
            .header("X-Request-Id", request_id);

        match self.context.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // Anonymous takers are reconciled through the guest session query parameter.
    fn with_guest_session(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.context.guest_session_id() {
            Some(guest) => builder.query(&[("guestSessionId", guest)]),
            None => builder,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    log::debug!("Request failed with {}: {}", status, body);
    Err(error_for_status(status, &body))
}

async fn expect_success(response: Response) -> AppResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, &body))
}

#[async_trait]
impl QuizApi for HttpApiClient {
    async fn list_quizzes(&self, query: &QuizListQuery) -> AppResult<Vec<Quiz>> {
        let response = self.request(Method::GET, "/Quiz").query(query).send().await?;
        read_json(response).await
    }

    async fn get_quiz(&self, quiz_id: i64) -> AppResult<Quiz> {
        let response = self
            .request(Method::GET, &format!("/Quiz/{}", quiz_id))
            .send()
            .await?;
        read_json(response).await
    }

    async fn create_quiz(&self, request: &QuizRequest) -> AppResult<Quiz> {
        let response = self
            .request(Method::POST, "/Quiz")
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_quiz(&self, quiz_id: i64, request: &QuizRequest) -> AppResult<Quiz> {
        let response = self
            .request(Method::PUT, &format!("/Quiz/{}", quiz_id))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_quiz(&self, quiz_id: i64) -> AppResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/Quiz/{}", quiz_id))
            .send()
            .await?;
        expect_success(response).await
    }

    async fn get_questions(
        &self,
        quiz_id: i64,
        access_key: Option<String>,
    ) -> AppResult<Vec<QuizQuestion>> {
        let mut builder = self.request(Method::GET, &format!("/quiz/{}/questions", quiz_id));
        if let Some(key) = access_key {
            builder = builder.query(&[("accessKey", key)]);
        }

        read_json(builder.send().await?).await
    }

    async fn create_question(&self, request: &QuestionRequest) -> AppResult<QuizQuestion> {
        let response = self
            .request(Method::POST, "/Question")
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_question(
        &self,
        question_id: i64,
        request: &QuestionRequest,
    ) -> AppResult<QuizQuestion> {
        let response = self
            .request(Method::PUT, &format!("/Question/{}", question_id))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_question(&self, question_id: i64) -> AppResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/Question/{}", question_id))
            .send()
            .await?;
        expect_success(response).await
    }
}

#[async_trait]
impl AttemptApi for HttpApiClient {
    async fn start_attempt(&self, quiz_id: i64) -> AppResult<QuizAttempt> {
        let builder = self.request(Method::POST, &format!("/attempt/{}/start", quiz_id));
        let response = self.with_guest_session(builder).send().await?;
        read_json(response).await
    }

    async fn stop_attempt(
        &self,
        attempt_id: i64,
        request: &SubmitAnswersRequest,
    ) -> AppResult<QuizAttempt> {
        let builder = self
            .request(Method::POST, &format!("/Attempt/{}/stop", attempt_id))
            .json(request);
        let response = self.with_guest_session(builder).send().await?;
        read_json(response).await
    }

    async fn get_attempt(&self, attempt_id: i64) -> AppResult<QuizAttempt> {
        let builder = self.request(Method::GET, &format!("/Attempt/{}", attempt_id));
        let response = self.with_guest_session(builder).send().await?;
        read_json(response).await
    }

    async fn get_attempt_answers(&self, attempt_id: i64) -> AppResult<Vec<QuizAttemptAnswer>> {
        let builder = self.request(Method::GET, &format!("/Attempt/{}/answers", attempt_id));
        let response = self.with_guest_session(builder).send().await?;
        read_json(response).await
    }

    async fn get_leaderboard(&self, quiz_id: i64) -> AppResult<Vec<LeaderboardEntry>> {
        let response = self
            .request(Method::GET, &format!("/Quiz/{}/leaderboard", quiz_id))
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl UserApi for HttpApiClient {
    async fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse> {
        let response = self
            .request(Method::POST, "/User/login")
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn register(&self, request: &RegisterRequest) -> AppResult<AuthResponse> {
        let response = self
            .request(Method::POST, "/User/register")
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_user(&self, user_id: i64) -> AppResult<User> {
        let response = self
            .request(Method::GET, &format!("/User/{}", user_id))
            .send()
            .await?;
        read_json(response).await
    }
}
