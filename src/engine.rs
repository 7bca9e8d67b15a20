// src/engine.rs

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::DEFAULT_DIFFICULTY,
    curriculum::Curriculum,
    error::QuizError,
    llm::QuestionSource,
    models::{
        progress::{
            Difficulty, ScoreResult, TopicState, TopicStatus, TopicsResponse, UserTopicProgress,
            accuracy,
        },
        question::{GeneratedQuiz, QuestionDraft},
    },
    store::{GradedAnswer, QuizStore},
};

/// Whether a user may attempt a topic right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Locked { next_allowed_topic: Option<String> },
}

/// Topic unlock sequencing and submission scoring over the quiz store.
#[derive(Clone)]
pub struct QuizEngine {
    curriculum: Arc<Curriculum>,
    store: QuizStore,
}

impl QuizEngine {
    pub fn new(curriculum: Arc<Curriculum>, store: QuizStore) -> Self {
        Self { curriculum, store }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn store(&self) -> &QuizStore {
        &self.store
    }

    /// Number of distinct topics the user has submitted at least once.
    ///
    /// Assumes topics are completed in curriculum order; out-of-order
    /// completions are counted the same way.
    pub async fn unlocked_index(&self, user_id: &str) -> Result<usize, QuizError> {
        let count = self.store.count_distinct_topics(user_id).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub async fn resolve_access(
        &self,
        user_id: &str,
        topic: &str,
    ) -> Result<AccessDecision, QuizError> {
        let idx = self
            .curriculum
            .position_of(topic)
            .ok_or_else(|| QuizError::UnknownTopic(topic.to_string()))?;

        let unlocked = self.unlocked_index(user_id).await?;
        if idx > unlocked {
            return Ok(AccessDecision::Locked {
                next_allowed_topic: self.curriculum.get(unlocked).map(str::to_string),
            });
        }

        Ok(AccessDecision::Allowed)
    }

    /// Appends one question row per pair, ordinals 0..n-1 in input order.
    /// Earlier batches stay in the store but are superseded for scoring.
    /// An empty list stores nothing.
    pub async fn record_generated_quiz(
        &self,
        user_id: &str,
        topic: &str,
        questions: &[QuestionDraft],
    ) -> Result<(), QuizError> {
        match self
            .store
            .insert_question_batch(user_id, topic, questions)
            .await?
        {
            Some(batch_id) => {
                tracing::debug!(batch_id, size = questions.len(), "Stored question batch")
            }
            None => tracing::debug!(topic, "Empty question batch, nothing stored"),
        }
        Ok(())
    }

    /// Gate, fetch from the source, store and return the batch.
    ///
    /// Nothing is stored when access is denied or the source fails.
    pub async fn generate_quiz(
        &self,
        source: &dyn QuestionSource,
        user_id: &str,
        topic: &str,
    ) -> Result<GeneratedQuiz, QuizError> {
        if let AccessDecision::Locked { next_allowed_topic } =
            self.resolve_access(user_id, topic).await?
        {
            return Err(QuizError::Locked { next_allowed_topic });
        }

        let questions = source.generate(topic).await?;
        let difficulty = self.difficulty_hint(user_id, topic).await?;

        self.record_generated_quiz(user_id, topic, &questions).await?;

        Ok(GeneratedQuiz {
            topic: topic.to_string(),
            questions,
            difficulty,
        })
    }

    /// Tier of the user's last accuracy on this topic, or the default for a fresh topic.
    pub async fn difficulty_hint(&self, user_id: &str, topic: &str) -> Result<Difficulty, QuizError> {
        let hint = match self.store.fetch_progress(user_id, topic).await? {
            Some(p) => Difficulty::from_accuracy(p.accuracy),
            None => Difficulty::new_unchecked(DEFAULT_DIFFICULTY),
        };
        Ok(hint)
    }

    /// Scores answers against the latest batch and replaces the progress record.
    ///
    /// Matching is exact and case-sensitive. Ordinals beyond the batch are
    /// ignored, so a topic with no batch scores zero instead of failing.
    pub async fn score_submission(
        &self,
        user_id: &str,
        topic: &str,
        answers: &BTreeMap<usize, String>,
    ) -> Result<ScoreResult, QuizError> {
        if self.curriculum.position_of(topic).is_none() {
            return Err(QuizError::UnknownTopic(topic.to_string()));
        }

        let batch = match answers.keys().next_back() {
            Some(&max) => {
                let limit = i64::try_from(max).map_or(i64::MAX, |m| m.saturating_add(1));
                self.store.fetch_recent_questions(user_id, topic, limit).await?
            }
            None => Vec::new(),
        };

        let mut graded = Vec::new();
        let (mut correct_count, mut incorrect_count) = (0i64, 0i64);

        for (&ordinal, submitted) in answers {
            let Some(q) = batch.get(ordinal) else {
                continue;
            };
            let is_correct = *submitted == q.answer;
            if is_correct {
                correct_count += 1;
            } else {
                incorrect_count += 1;
            }
            graded.push(GradedAnswer {
                question_id: q.id,
                user_answer: submitted.clone(),
                is_correct,
            });
        }

        let accuracy = accuracy(correct_count, incorrect_count);
        let progress = UserTopicProgress {
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            correct_answers: correct_count,
            incorrect_answers: incorrect_count,
            accuracy,
            updated_at: Utc::now(),
        };

        self.store.record_submission(&graded, &progress).await?;

        tracing::info!(
            user_id,
            correct_count,
            incorrect_count,
            accuracy,
            "Quiz submission scored"
        );

        Ok(ScoreResult {
            correct_count,
            incorrect_count,
            accuracy,
            difficulty: Difficulty::from_accuracy(accuracy),
        })
    }

    /// Every curriculum topic with its state for this user, in order.
    pub async fn topic_statuses(&self, user_id: &str) -> Result<TopicsResponse, QuizError> {
        let unlocked_index = self.unlocked_index(user_id).await?;
        let completed: HashSet<String> = self
            .store
            .completed_topics(user_id)
            .await?
            .into_iter()
            .collect();

        let topics = self
            .curriculum
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                let status = if completed.contains(topic) {
                    TopicState::Retake
                } else if i == unlocked_index {
                    TopicState::Available
                } else {
                    TopicState::Locked
                };
                TopicStatus {
                    topic: topic.to_string(),
                    status,
                }
            })
            .collect();

        Ok(TopicsResponse {
            unlocked_index,
            topics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use async_trait::async_trait;

    struct FixedSource(Vec<QuestionDraft>);

    #[async_trait]
    impl QuestionSource for FixedSource {
        async fn generate(&self, _topic: &str) -> Result<Vec<QuestionDraft>, QuizError> {
            Ok(self.0.clone())
        }
    }

    struct DownSource;

    #[async_trait]
    impl QuestionSource for DownSource {
        async fn generate(&self, _topic: &str) -> Result<Vec<QuestionDraft>, QuizError> {
            Err(QuizError::SourceUnavailable("offline".to_string()))
        }
    }

    async fn engine() -> QuizEngine {
        engine_with_pool().await.0
    }

    async fn engine_with_pool() -> (QuizEngine, sqlx::SqlitePool) {
        let curriculum = Curriculum::new(vec!["A".into(), "B".into(), "C".into()]).unwrap();
        let pool = db::in_memory().await.unwrap();
        let engine = QuizEngine::new(Arc::new(curriculum), QuizStore::new(pool.clone()));
        (engine, pool)
    }

    fn answers(pairs: &[(usize, &str)]) -> BTreeMap<usize, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    fn locked_on(next: &str) -> AccessDecision {
        AccessDecision::Locked {
            next_allowed_topic: Some(next.to_string()),
        }
    }

    #[tokio::test]
    async fn fresh_user_only_reaches_first_topic() {
        let e = engine().await;
        assert_eq!(e.resolve_access("u1", "A").await.unwrap(), AccessDecision::Allowed);
        assert_eq!(e.resolve_access("u1", "B").await.unwrap(), locked_on("A"));
        assert_eq!(e.resolve_access("u1", "C").await.unwrap(), locked_on("A"));
    }

    #[tokio::test]
    async fn unknown_topic_is_rejected() {
        let e = engine().await;
        assert!(matches!(
            e.resolve_access("u1", "Z").await,
            Err(QuizError::UnknownTopic(t)) if t == "Z"
        ));
        assert!(matches!(
            e.score_submission("u1", "Z", &answers(&[(0, "x")])).await,
            Err(QuizError::UnknownTopic(_))
        ));
    }

    #[tokio::test]
    async fn correct_submission_unlocks_next_topic() {
        let e = engine().await;
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("q0", "x")])
            .await
            .unwrap();

        let score = e.score_submission("u1", "A", &answers(&[(0, "x")])).await.unwrap();
        assert_eq!(score.correct_count, 1);
        assert_eq!(score.incorrect_count, 0);
        assert_eq!(score.accuracy, 100.0);
        assert_eq!(score.difficulty.value(), 5);

        assert_eq!(e.resolve_access("u1", "B").await.unwrap(), AccessDecision::Allowed);
        assert_eq!(e.resolve_access("u1", "C").await.unwrap(), locked_on("B"));
    }

    #[tokio::test]
    async fn wrong_answer_still_unlocks() {
        let e = engine().await;
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("q0", "x")])
            .await
            .unwrap();

        let score = e.score_submission("u1", "A", &answers(&[(0, "y")])).await.unwrap();
        assert_eq!(score.accuracy, 0.0);
        assert_eq!(score.difficulty.value(), 2);
        assert_eq!(e.resolve_access("u1", "B").await.unwrap(), AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn empty_batch_scores_zero() {
        let e = engine().await;
        e.record_generated_quiz("u1", "A", &[]).await.unwrap();

        let score = e.score_submission("u1", "A", &answers(&[(0, "x")])).await.unwrap();
        assert_eq!(score.correct_count, 0);
        assert_eq!(score.incorrect_count, 0);
        assert_eq!(score.accuracy, 0.0);
    }

    #[tokio::test]
    async fn never_generated_topic_scores_zero() {
        let e = engine().await;
        let score = e.score_submission("u1", "A", &answers(&[(0, "x"), (3, "y")])).await.unwrap();
        assert_eq!(score.correct_count + score.incorrect_count, 0);
        assert_eq!(score.difficulty.value(), 2);
    }

    #[tokio::test]
    async fn matching_is_exact_and_ignores_out_of_range() {
        let e = engine().await;
        let batch = vec![
            QuestionDraft::new("q0", "A"),
            QuestionDraft::new("q1", "B"),
            QuestionDraft::new("q2", "C"),
            QuestionDraft::new("q3", "D"),
        ];
        e.record_generated_quiz("u1", "A", &batch).await.unwrap();

        let score = e
            .score_submission(
                "u1",
                "A",
                &answers(&[(0, "A"), (1, "b"), (2, "C"), (3, "D"), (9, "A")]),
            )
            .await
            .unwrap();
        assert_eq!(score.correct_count, 3);
        assert_eq!(score.incorrect_count, 1);
        assert_eq!(score.accuracy, 75.0);
        assert_eq!(score.difficulty.value(), 3);
    }

    #[tokio::test]
    async fn scoring_uses_latest_batch() {
        let e = engine().await;
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("old", "x")])
            .await
            .unwrap();
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("new", "y")])
            .await
            .unwrap();

        let score = e.score_submission("u1", "A", &answers(&[(0, "y")])).await.unwrap();
        assert_eq!(score.correct_count, 1);

        // An empty regeneration leaves the last stored batch current.
        e.record_generated_quiz("u1", "A", &[]).await.unwrap();
        let score = e.score_submission("u1", "A", &answers(&[(0, "y")])).await.unwrap();
        assert_eq!(score.correct_count, 1);
        assert_eq!(score.incorrect_count, 0);
    }

    #[tokio::test]
    async fn resubmission_replaces_progress() {
        let e = engine().await;
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("q0", "x")])
            .await
            .unwrap();

        e.score_submission("u1", "A", &answers(&[(0, "y")])).await.unwrap();
        assert_eq!(e.unlocked_index("u1").await.unwrap(), 1);

        e.score_submission("u1", "A", &answers(&[(0, "x")])).await.unwrap();
        assert_eq!(e.unlocked_index("u1").await.unwrap(), 1);

        let progress = e.store().fetch_progress("u1", "A").await.unwrap().unwrap();
        assert_eq!(progress.correct_answers, 1);
        assert_eq!(progress.incorrect_answers, 0);
        assert_eq!(progress.accuracy, 100.0);
    }

    #[tokio::test]
    async fn failed_progress_write_rolls_back_answers() {
        let (e, pool) = engine_with_pool().await;
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("q0", "x")])
            .await
            .unwrap();
        e.score_submission("u1", "A", &answers(&[(0, "y")])).await.unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER reject_progress BEFORE INSERT ON user_progress
            BEGIN
                SELECT RAISE(ABORT, 'progress writes disabled');
            END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = e
            .score_submission("u1", "A", &answers(&[(0, "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Store(_)));

        let progress = e.store().fetch_progress("u1", "A").await.unwrap().unwrap();
        assert_eq!(progress.correct_answers, 0);
        assert_eq!(progress.incorrect_answers, 1);

        let stored = e.store().fetch_recent_questions("u1", "A", 1).await.unwrap();
        assert_eq!(stored[0].user_answer.as_deref(), Some("y"));
        assert_eq!(stored[0].is_correct, Some(false));
    }

    #[tokio::test]
    async fn progress_is_scoped_per_user() {
        let e = engine().await;
        e.score_submission("u1", "A", &answers(&[])).await.unwrap();
        assert_eq!(e.resolve_access("u1", "B").await.unwrap(), AccessDecision::Allowed);
        assert_eq!(e.resolve_access("u2", "B").await.unwrap(), locked_on("A"));
    }

    #[tokio::test]
    async fn completing_everything_leaves_no_next_topic() {
        let e = engine().await;
        for topic in ["A", "B", "C"] {
            e.score_submission("u1", topic, &answers(&[])).await.unwrap();
        }
        assert_eq!(e.unlocked_index("u1").await.unwrap(), 3);
        assert_eq!(e.resolve_access("u1", "C").await.unwrap(), AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn generate_quiz_gates_and_stores() {
        let e = engine().await;
        let source = FixedSource(vec![QuestionDraft::new("q0", "x"), QuestionDraft::new("q1", "y")]);

        let err = e.generate_quiz(&source, "u1", "B").await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Locked { next_allowed_topic: Some(ref t) } if t == "A"
        ));
        assert!(e.store().fetch_recent_questions("u1", "B", 10).await.unwrap().is_empty());

        let quiz = e.generate_quiz(&source, "u1", "A").await.unwrap();
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.difficulty.value(), DEFAULT_DIFFICULTY);

        let stored = e.store().fetch_recent_questions("u1", "A", 10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].ordinal, 1);
        assert_eq!(stored[1].answer, "y");
    }

    #[tokio::test]
    async fn difficulty_hint_follows_last_accuracy() {
        let e = engine().await;
        let source = FixedSource(vec![QuestionDraft::new("q0", "x")]);
        e.generate_quiz(&source, "u1", "A").await.unwrap();
        e.score_submission("u1", "A", &answers(&[(0, "x")])).await.unwrap();

        let quiz = e.generate_quiz(&source, "u1", "A").await.unwrap();
        assert_eq!(quiz.difficulty.value(), 5);
    }

    /// Drops the progress table while generating, so the hint read after it fails.
    struct BreakingSource(sqlx::SqlitePool);

    #[async_trait]
    impl QuestionSource for BreakingSource {
        async fn generate(&self, _topic: &str) -> Result<Vec<QuestionDraft>, QuizError> {
            sqlx::query("DROP TABLE user_progress").execute(&self.0).await?;
            Ok(vec![QuestionDraft::new("q0", "x")])
        }
    }

    #[tokio::test]
    async fn failed_difficulty_read_stores_no_questions() {
        let (e, pool) = engine_with_pool().await;
        let err = e
            .generate_quiz(&BreakingSource(pool), "u1", "A")
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Store(_)));
        assert!(e.store().fetch_recent_questions("u1", "A", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_regeneration_keeps_previous_batch() {
        let e = engine().await;
        e.record_generated_quiz("u1", "A", &[QuestionDraft::new("q0", "x")])
            .await
            .unwrap();
        e.generate_quiz(&FixedSource(vec![]), "u1", "A").await.unwrap();

        let score = e.score_submission("u1", "A", &answers(&[(0, "x")])).await.unwrap();
        assert_eq!(score.correct_count, 1);
        assert_eq!(score.incorrect_count, 0);
    }

    #[tokio::test]
    async fn source_failure_stores_nothing() {
        let e = engine().await;
        let err = e.generate_quiz(&DownSource, "u1", "A").await.unwrap_err();
        assert!(matches!(err, QuizError::SourceUnavailable(_)));
        assert_eq!(e.unlocked_index("u1").await.unwrap(), 0);
        assert!(e.store().fetch_recent_questions("u1", "A", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn topic_listing_marks_retake_available_locked() {
        let e = engine().await;
        e.score_submission("u1", "A", &answers(&[])).await.unwrap();

        let listing = e.topic_statuses("u1").await.unwrap();
        assert_eq!(listing.unlocked_index, 1);
        let states: Vec<_> = listing.topics.iter().map(|t| t.status).collect();
        assert_eq!(
            states,
            vec![TopicState::Retake, TopicState::Available, TopicState::Locked]
        );
    }

    #[tokio::test]
    async fn history_lists_answered_questions_only() {
        let e = engine().await;
        e.record_generated_quiz(
            "u1",
            "A",
            &[QuestionDraft::new("q0", "x"), QuestionDraft::new("q1", "y")],
        )
        .await
        .unwrap();
        e.score_submission("u1", "A", &answers(&[(0, "x")])).await.unwrap();

        let history = e.store().quiz_history("u1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "q0");
        assert_eq!(history[0].user_answer.as_deref(), Some("x"));
        assert_eq!(history[0].is_correct, Some(true));
    }
}
