use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use futures::future::join_all;

use crate::{
    api::{QuizApi, UserApi},
    errors::AppResult,
    models::{
        domain::Quiz,
        dto::{request::QuizListQuery, response::QuizSummary},
    },
};

pub struct CatalogService {
    quiz_api: Arc<dyn QuizApi>,
    user_api: Arc<dyn UserApi>,
}

impl CatalogService {
    pub fn new(quiz_api: Arc<dyn QuizApi>, user_api: Arc<dyn UserApi>) -> Self {
        Self { quiz_api, user_api }
    }

    /// Lists the catalog. Question counts and author names are best effort.
    pub async fn list_quizzes(&self, query: &QuizListQuery) -> AppResult<Vec<QuizSummary>> {
        let quizzes = self.quiz_api.list_quizzes(query).await?;

        let author_ids: BTreeSet<i64> = quizzes.iter().filter_map(|q| q.author_id).collect();
        let names = join_all(author_ids.into_iter().map(|id| async move {
            (id, self.author_name(id).await)
        }))
        .await;
        let names: HashMap<i64, Option<String>> = names.into_iter().collect();

        let counts = join_all(quizzes.iter().map(|quiz| self.question_count(quiz))).await;

        Ok(quizzes
            .into_iter()
            .zip(counts)
            .map(|(quiz, question_count)| {
                let author_name = quiz
                    .author_id
                    .and_then(|id| names.get(&id).cloned().flatten());
                QuizSummary {
                    quiz,
                    question_count,
                    author_name,
                }
            })
            .collect())
    }

    pub async fn quiz_detail(&self, quiz_id: i64) -> AppResult<QuizSummary> {
        let quiz = self.quiz_api.get_quiz(quiz_id).await?;

        let (question_count, author_name) = futures::join!(self.question_count(&quiz), async {
            match quiz.author_id {
                Some(id) => self.author_name(id).await,
                None => None,
            }
        });

        Ok(QuizSummary {
            quiz,
            question_count,
            author_name,
        })
    }

    async fn question_count(&self, quiz: &Quiz) -> Option<usize> {
        // Private quizzes need an access key the catalog does not have
        if !quiz.is_public {
            return None;
        }

        match self.quiz_api.get_questions(quiz.id, None).await {
            Ok(questions) => Some(questions.len()),
            Err(err) => {
                log::warn!("Question count for quiz {} unavailable: {}", quiz.id, err);
                None
            }
        }
    }

    async fn author_name(&self, author_id: i64) -> Option<String> {
        match self.user_api.get_user(author_id).await {
            Ok(user) => Some(user.display_name().to_string()),
            Err(err) => {
                log::warn!("Author {} lookup failed: {}", author_id, err);
                None
            }
        }
    }
}
