// src/store.rs

use chrono::Utc;
use sqlx::{SqlitePool, types::Json};

use crate::models::{
    progress::UserTopicProgress,
    question::{AttemptEntry, GeneratedQuestion, QuestionDraft},
    tutor::{CodeReview, DoubtAnswer},
};

/// A graded answer, ready to be written back onto its question row.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub user_answer: String,
    pub is_correct: bool,
}

/// SQLite-backed persistence for questions, progress and tutor logs.
#[derive(Clone)]
pub struct QuizStore {
    pool: SqlitePool,
}

impl QuizStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of distinct topics the user has at least one progress record for.
    pub async fn count_distinct_topics(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT topic) FROM user_progress WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn completed_topics(&self, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT topic FROM user_progress WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    pub async fn fetch_progress(
        &self,
        user_id: &str,
        topic: &str,
    ) -> Result<Option<UserTopicProgress>, sqlx::Error> {
        sqlx::query_as::<_, UserTopicProgress>(
            r#"
            SELECT user_id, topic, correct_answers, incorrect_answers, accuracy, updated_at
            FROM user_progress
            WHERE user_id = ? AND topic = ?
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .fetch_optional(&self.pool)
        .await
    }

    /// Stores one generation batch. Questions get ordinals 0..n-1 in input order.
    /// An empty list writes nothing, so the previous batch stays current.
    pub async fn insert_question_batch(
        &self,
        user_id: &str,
        topic: &str,
        questions: &[QuestionDraft],
    ) -> Result<Option<i64>, sqlx::Error> {
        if questions.is_empty() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        let (batch_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO quiz_batches (user_id, topic, size, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(questions.len() as i64)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for (ordinal, q) in questions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO generated_questions
                    (batch_id, user_id, topic, ordinal, question, options, answer)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(batch_id)
            .bind(user_id)
            .bind(topic)
            .bind(ordinal as i64)
            .bind(&q.question)
            .bind(Json(&q.options))
            .bind(&q.answer)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(batch_id))
    }

    /// Questions of the most recent batch for (user, topic), in ordinal order,
    /// capped at `limit`. Empty if the topic was never generated.
    pub async fn fetch_recent_questions(
        &self,
        user_id: &str,
        topic: &str,
        limit: i64,
    ) -> Result<Vec<GeneratedQuestion>, sqlx::Error> {
        sqlx::query_as::<_, GeneratedQuestion>(
            r#"
            SELECT id, batch_id, user_id, topic, ordinal, question, options, answer,
                   user_answer, is_correct
            FROM generated_questions
            WHERE batch_id = (
                SELECT MAX(id) FROM quiz_batches WHERE user_id = ? AND topic = ?
            )
            ORDER BY ordinal ASC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Writes graded answers and replaces the progress record in one transaction,
    /// so there is never a window with zero progress rows for the topic.
    pub async fn record_submission(
        &self,
        graded: &[GradedAnswer],
        progress: &UserTopicProgress,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let answered_at = Utc::now();

        for g in graded {
            sqlx::query(
                r#"
                UPDATE generated_questions
                SET user_answer = ?, is_correct = ?, answered_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&g.user_answer)
            .bind(g.is_correct)
            .bind(answered_at)
            .bind(g.question_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM user_progress WHERE user_id = ? AND topic = ?")
            .bind(&progress.user_id)
            .bind(&progress.topic)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_progress
                (user_id, topic, correct_answers, incorrect_answers, accuracy, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&progress.user_id)
        .bind(&progress.topic)
        .bind(progress.correct_answers)
        .bind(progress.incorrect_answers)
        .bind(progress.accuracy)
        .bind(progress.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// Answered questions for the user, newest first.
    pub async fn quiz_history(&self, user_id: &str) -> Result<Vec<AttemptEntry>, sqlx::Error> {
        sqlx::query_as::<_, AttemptEntry>(
            r#"
            SELECT topic, question, user_answer, answer AS correct_answer, is_correct, answered_at
            FROM generated_questions
            WHERE user_id = ? AND is_correct IS NOT NULL
            ORDER BY answered_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn insert_doubt(
        &self,
        user_id: &str,
        question: &str,
        answer: &DoubtAnswer,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_doubts (user_id, question, response, detected_topic, complexity, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(question)
        .bind(&answer.response)
        .bind(&answer.detected_topic)
        .bind(&answer.complexity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_code_attempt(
        &self,
        user_id: &str,
        topic: &str,
        language: &str,
        code: &str,
        review: &CodeReview,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_code_attempts
                (user_id, topic, language, code, syntax_errors, logic_feedback,
                 time_complexity, space_complexity, suggestion, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(language)
        .bind(code)
        .bind(&review.syntax_errors)
        .bind(&review.logic_feedback)
        .bind(&review.time_complexity)
        .bind(&review.space_complexity)
        .bind(&review.suggestion)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
