use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use crate::{
    api::{AttemptApi, QuizApi},
    errors::AppResult,
    models::dto::response::{AttemptReview, LeaderboardEntry, QuestionReview, RankedEntry},
    services::grading_service::GradingService,
};

pub struct ResultService {
    quiz_api: Arc<dyn QuizApi>,
    attempt_api: Arc<dyn AttemptApi>,
}

impl ResultService {
    pub fn new(quiz_api: Arc<dyn QuizApi>, attempt_api: Arc<dyn AttemptApi>) -> Self {
        Self {
            quiz_api,
            attempt_api,
        }
    }

    /// Attempt, chosen options and per-question status for the result page.
    pub async fn review(&self, attempt_id: i64, access_key: Option<String>) -> AppResult<AttemptReview> {
        let (attempt, answers) = futures::try_join!(
            self.attempt_api.get_attempt(attempt_id),
            self.attempt_api.get_attempt_answers(attempt_id)
        )?;

        let (quiz, questions) = futures::try_join!(
            self.quiz_api.get_quiz(attempt.quiz_id),
            self.quiz_api.get_questions(attempt.quiz_id, access_key)
        )?;

        let mut selected: HashMap<i64, Vec<i64>> = answers
            .into_iter()
            .map(|a| (a.question_id, a.selected_option_ids))
            .collect();

        let questions = questions
            .into_iter()
            .map(|question| {
                let selected_option_ids = selected.remove(&question.id).unwrap_or_default();
                let status = GradingService::question_status(&question, &selected_option_ids);
                QuestionReview {
                    question,
                    selected_option_ids,
                    status,
                }
            })
            .collect();

        Ok(AttemptReview {
            attempt,
            quiz,
            questions,
        })
    }

    pub async fn leaderboard(&self, quiz_id: i64) -> AppResult<Vec<RankedEntry>> {
        let entries = self.attempt_api.get_leaderboard(quiz_id).await?;
        Ok(rank_leaderboard(entries))
    }
}

fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| match (a.time_taken, b.time_taken) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

/// Highest score first, faster time breaks ties; identical results share a rank.
pub fn rank_leaderboard(mut entries: Vec<LeaderboardEntry>) -> Vec<RankedEntry> {
    entries.sort_by(compare_entries);

    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(previous) if compare_entries(&previous.entry, &entry) == Ordering::Equal => {
                previous.rank
            }
            _ => position + 1,
        };
        ranked.push(RankedEntry { rank, entry });
    }
    ranked
}
