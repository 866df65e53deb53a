use async_trait::async_trait;
use drill_core::model::{CourseId, ModuleId, SubjectId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64};
use crate::repository::{CatalogRepository, StorageError};

#[async_trait]
impl CatalogRepository for SqliteRepository {
    async fn record_subject(&self, id: SubjectId, name: &str) -> Result<(), StorageError> {
        sqlx::query("INSERT OR IGNORE INTO subjects (id, name) VALUES (?1, ?2)")
            .bind(id_to_i64("subject_id", id.value())?)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn record_course(
        &self,
        id: CourseId,
        name: &str,
        subject: SubjectId,
    ) -> Result<(), StorageError> {
        sqlx::query("INSERT OR IGNORE INTO courses (id, name, subject_id) VALUES (?1, ?2, ?3)")
            .bind(id_to_i64("course_id", id.value())?)
            .bind(name)
            .bind(id_to_i64("subject_id", subject.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn record_module(
        &self,
        id: ModuleId,
        name: &str,
        course: CourseId,
    ) -> Result<(), StorageError> {
        sqlx::query("INSERT OR IGNORE INTO modules (id, name, course_id) VALUES (?1, ?2, ?3)")
            .bind(id_to_i64("module_id", id.value())?)
            .bind(name)
            .bind(id_to_i64("course_id", course.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
