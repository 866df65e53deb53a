use async_trait::async_trait;
use drill_core::model::{
    AnswerId, Course, CourseId, Module, ModuleId, QuestionKey, Subject, SubjectId,
};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a question whose correct answer is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedQuestion {
    pub key: QuestionKey,
    /// Markup-free prompt the answer was learned for.
    pub content: String,
    pub right_answer: AnswerId,
}

/// Lookup table from a question key to its known-correct answer.
#[async_trait]
pub trait AnswerCache: Send + Sync {
    /// Fetch the stored answer for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried. A missing row is
    /// `Ok(None)`, never an error.
    async fn lookup(&self, key: &QuestionKey) -> Result<Option<AnswerId>, StorageError>;

    /// Store `question` unless a row for its key already exists.
    ///
    /// Existing rows are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the insert fails for reasons other than an
    /// existing row (e.g. a missing catalog row under enforced foreign keys).
    async fn record(&self, question: CachedQuestion) -> Result<(), StorageError>;
}

/// Insert-or-ignore registry of the subject/course/module hierarchy.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn record_subject(&self, id: SubjectId, name: &str) -> Result<(), StorageError>;

    async fn record_course(
        &self,
        id: CourseId,
        name: &str,
        subject: SubjectId,
    ) -> Result<(), StorageError>;

    async fn record_module(
        &self,
        id: ModuleId,
        name: &str,
        course: CourseId,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<QuestionKey, CachedQuestion>>>,
    subjects: Arc<Mutex<HashMap<SubjectId, String>>>,
    courses: Arc<Mutex<HashMap<CourseId, (String, SubjectId)>>>,
    modules: Arc<Mutex<HashMap<ModuleId, (String, CourseId)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn question_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }

    /// The stored row for `key`, content included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn cached(&self, key: &QuestionKey) -> Result<Option<CachedQuestion>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    /// Snapshot of the stored subjects, courses and modules.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if a lock is poisoned.
    pub fn catalog_snapshot(&self) -> Result<Vec<Subject>, StorageError> {
        let subjects = self
            .subjects
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let courses = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out: Vec<Subject> = subjects
            .iter()
            .map(|(id, name)| Subject {
                id: *id,
                name: name.clone(),
                courses: courses
                    .iter()
                    .filter(|(_, (_, subject))| subject == id)
                    .map(|(cid, (cname, _))| Course {
                        id: *cid,
                        name: cname.clone(),
                    })
                    .collect(),
            })
            .collect();
        out.sort_by_key(|s| s.id);
        for subject in &mut out {
            subject.courses.sort_by_key(|c| c.id);
        }
        Ok(out)
    }

    /// Modules stored under `course`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn modules_of(&self, course: CourseId) -> Result<Vec<Module>, StorageError> {
        let guard = self
            .modules
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Module> = guard
            .iter()
            .filter(|(_, (_, c))| *c == course)
            .map(|(id, (name, _))| Module {
                id: *id,
                name: name.clone(),
                mastery: drill_core::model::Mastery::default(),
            })
            .collect();
        found.sort_by_key(|m| m.id);
        Ok(found)
    }
}

#[async_trait]
impl AnswerCache for InMemoryRepository {
    async fn lookup(&self, key: &QuestionKey) -> Result<Option<AnswerId>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).map(|q| q.right_answer))
    }

    async fn record(&self, question: CachedQuestion) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Entry::Vacant(slot) = guard.entry(question.key) {
            slot.insert(question);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn record_subject(&self, id: SubjectId, name: &str) -> Result<(), StorageError> {
        let mut guard = self
            .subjects
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.entry(id).or_insert_with(|| name.to_string());
        Ok(())
    }

    async fn record_course(
        &self,
        id: CourseId,
        name: &str,
        subject: SubjectId,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.entry(id).or_insert_with(|| (name.to_string(), subject));
        Ok(())
    }

    async fn record_module(
        &self,
        id: ModuleId,
        name: &str,
        course: CourseId,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .modules
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.entry(id).or_insert_with(|| (name.to_string(), course));
        Ok(())
    }
}

/// Aggregates the cache and catalog repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub answers: Arc<dyn AnswerCache>,
    pub catalog: Arc<dyn CatalogRepository>,
}
