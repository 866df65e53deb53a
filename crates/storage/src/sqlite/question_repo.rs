use async_trait::async_trait;
use drill_core::model::{AnswerId, QuestionKey};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{answer_id_from_i64, conn, id_to_i64, ser};
use crate::repository::{AnswerCache, CachedQuestion, StorageError};

struct KeyParams {
    question: i64,
    subject: i64,
    course: i64,
    module: i64,
}

impl KeyParams {
    fn from_key(key: &QuestionKey) -> Result<Self, StorageError> {
        Ok(Self {
            question: id_to_i64("question_id", key.question.value())?,
            subject: id_to_i64("subject_id", key.subject.value())?,
            course: id_to_i64("course_id", key.course.value())?,
            module: id_to_i64("module_id", key.module.value())?,
        })
    }
}

#[async_trait]
impl AnswerCache for SqliteRepository {
    async fn lookup(&self, key: &QuestionKey) -> Result<Option<AnswerId>, StorageError> {
        let params = KeyParams::from_key(key)?;
        let row = sqlx::query(
            r"
            SELECT right_answer
            FROM questions
            WHERE id = ?1 AND subject_id = ?2 AND course_id = ?3 AND module_id = ?4
            ",
        )
        .bind(params.question)
        .bind(params.subject)
        .bind(params.course)
        .bind(params.module)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: i64 = row.try_get("right_answer").map_err(ser)?;
        answer_id_from_i64(raw).map(Some)
    }

    async fn record(&self, question: CachedQuestion) -> Result<(), StorageError> {
        let params = KeyParams::from_key(&question.key)?;
        sqlx::query(
            r"
            INSERT OR IGNORE INTO questions (id, content, right_answer, subject_id, course_id, module_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(params.question)
        .bind(question.content)
        .bind(id_to_i64("right_answer", question.right_answer.value())?)
        .bind(params.subject)
        .bind(params.course)
        .bind(params.module)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
