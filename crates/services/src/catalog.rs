//! Subject/course/module hierarchy as seen by the learner.

use drill_core::model::{CourseId, Mastery, Module, ModuleId, Subject, SubjectId};
use storage::repository::{CatalogRepository, StorageError};
use tracing::debug;

use crate::error::PlatformError;
use crate::platform::LearningPlatform;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCourse {
    pub id: CourseId,
    pub name: String,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSubject {
    pub id: SubjectId,
    pub name: String,
    pub courses: Vec<CatalogCourse>,
}

/// One line of the info table.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub course_id: CourseId,
    pub course_name: String,
    pub module_id: ModuleId,
    pub module_name: String,
    pub mastery: Mastery,
}

/// Where a module sits in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleLocation<'a> {
    pub subject: &'a CatalogSubject,
    pub course: &'a CatalogCourse,
    pub module: &'a Module,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub subjects: Vec<CatalogSubject>,
}

impl Catalog {
    /// Walk subjects, then each course's modules, in platform order.
    ///
    /// # Errors
    ///
    /// Returns the first `PlatformError` hit while listing.
    pub async fn fetch(platform: &dyn LearningPlatform) -> Result<Self, PlatformError> {
        let available = platform.list_available().await?;
        let mut subjects = Vec::with_capacity(available.len());
        for Subject { id, name, courses } in available {
            let mut catalog_courses = Vec::with_capacity(courses.len());
            for course in courses {
                let modules = platform.list_modules(course.id).await?;
                debug!(course = %course.id, modules = modules.len(), "listed modules");
                catalog_courses.push(CatalogCourse {
                    id: course.id,
                    name: course.name,
                    modules,
                });
            }
            subjects.push(CatalogSubject {
                id,
                name,
                courses: catalog_courses,
            });
        }
        Ok(Self { subjects })
    }

    /// Flatten to one row per module. Courses without modules produce no rows.
    #[must_use]
    pub fn rows(&self) -> Vec<CatalogRow> {
        self.subjects
            .iter()
            .flat_map(|subject| {
                subject.courses.iter().flat_map(move |course| {
                    course.modules.iter().map(move |module| CatalogRow {
                        subject_id: subject.id,
                        subject_name: subject.name.clone(),
                        course_id: course.id,
                        course_name: course.name.clone(),
                        module_id: module.id,
                        module_name: module.name.clone(),
                        mastery: module.mastery,
                    })
                })
            })
            .collect()
    }

    #[must_use]
    pub fn find_module(&self, id: ModuleId) -> Option<ModuleLocation<'_>> {
        self.subjects.iter().find_map(|subject| {
            subject.courses.iter().find_map(|course| {
                course
                    .modules
                    .iter()
                    .find(|m| m.id == id)
                    .map(|module| ModuleLocation {
                        subject,
                        course,
                        module,
                    })
            })
        })
    }

    /// Store the whole hierarchy; rows that already exist are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any insert fails.
    pub async fn persist(&self, repo: &dyn CatalogRepository) -> Result<(), StorageError> {
        for subject in &self.subjects {
            repo.record_subject(subject.id, &subject.name).await?;
            for course in &subject.courses {
                repo.record_course(course.id, &course.name, subject.id)
                    .await?;
                for module in &course.modules {
                    repo.record_module(module.id, &module.name, course.id)
                        .await?;
                }
            }
        }
        Ok(())
    }
}
