use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{SeedableRng, rng};
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

use drill_core::model::{
    AnswerId, Exercise, LearningScope, Mastery, SessionStats, mastery_of,
};
use storage::repository::{AnswerCache, CachedQuestion, CatalogRepository};

use super::options::SessionOptions;
use crate::catalog::Catalog;
use crate::error::{PlatformError, SessionError};
use crate::oracle::AnswerOracle;
use crate::pacing::{Shutdown, SleepOutcome};
use crate::platform::{LearningPlatform, Submission};

/// Why a session ended.
#[derive(Debug)]
pub enum StopReason {
    /// Shutdown was triggered before an iteration or during a pause.
    Cancelled,
    /// The platform ran out of activities for this learner.
    NoMoreActivity,
    MasteryReached(Mastery),
    Failed(SessionError),
}

impl StopReason {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::Failed(_))
    }
}

#[derive(Debug)]
pub struct SessionReport {
    pub stats: SessionStats,
    pub stop: StopReason,
}

enum Flow {
    Continue,
    Stop(StopReason),
}

/// Drives fetch, decide, submit, correct and refresh until something stops it.
pub struct SessionDriver {
    platform: Arc<dyn LearningPlatform>,
    scope: LearningScope,
    options: SessionOptions,
    cache: Option<Arc<dyn AnswerCache>>,
    oracle: Option<Arc<dyn AnswerOracle>>,
    rng: StdRng,
}

impl SessionDriver {
    #[must_use]
    pub fn new(
        platform: Arc<dyn LearningPlatform>,
        scope: LearningScope,
        options: SessionOptions,
    ) -> Self {
        Self {
            platform,
            scope,
            options,
            cache: None,
            oracle: None,
            rng: StdRng::from_rng(&mut rng()),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn AnswerCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn AnswerOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Seeded generator for pacing and random picks.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Make sure the catalog rows the cached questions point at exist.
    ///
    /// Names come from the platform catalog; a failed listing or a module
    /// outside the listed hierarchy falls back to empty names so the foreign
    /// keys are still satisfied. Does nothing when the cache is disabled or no
    /// repository is given.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if an insert fails.
    pub async fn prepare(
        &self,
        catalog: Option<&dyn CatalogRepository>,
    ) -> Result<(), SessionError> {
        let Some(catalog) = catalog.filter(|_| self.options.use_cache) else {
            return Ok(());
        };

        let (subject_name, course_name, module_name) = self.catalog_names().await;
        catalog
            .record_subject(self.scope.subject, &subject_name)
            .await?;
        catalog
            .record_course(self.scope.course, &course_name, self.scope.subject)
            .await?;
        catalog
            .record_module(self.scope.module, &module_name, self.scope.course)
            .await?;
        Ok(())
    }

    async fn catalog_names(&self) -> (String, String, String) {
        let listed = match Catalog::fetch(self.platform.as_ref()).await {
            Ok(listed) => listed,
            Err(err) => {
                warn!(error = %err, "could not list catalog, caching catalog without names");
                return Default::default();
            }
        };
        match listed.find_module(self.scope.module) {
            Some(found)
                if found.subject.id == self.scope.subject
                    && found.course.id == self.scope.course =>
            {
                (
                    found.subject.name.clone(),
                    found.course.name.clone(),
                    found.module.name.clone(),
                )
            }
            _ => {
                warn!("module not listed under the chosen course, caching catalog without names");
                Default::default()
            }
        }
    }

    /// Run until cancelled, exhausted, capped or failed.
    pub async fn run(&mut self, shutdown: &Shutdown) -> SessionReport {
        let mut stats = SessionStats::new();
        if let Err(err) = self.check_wiring() {
            return SessionReport {
                stats,
                stop: StopReason::Failed(err),
            };
        }

        info!(
            subject = %self.scope.subject,
            course = %self.scope.course,
            module = %self.scope.module,
            use_cache = self.options.use_cache,
            use_llm = self.options.use_llm,
            "session started"
        );

        let stop = loop {
            if shutdown.is_triggered() {
                break StopReason::Cancelled;
            }

            let span = info_span!(
                "iteration",
                course_id = %self.scope.course,
                module_id = %self.scope.module,
                question_id = field::Empty,
                attempt_id = field::Empty,
            );
            match self.iterate(&mut stats).instrument(span.clone()).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(reason)) => break reason,
                Err(SessionError::Platform(PlatformError::NoMoreActivity)) => {
                    span.in_scope(|| info!("no more activity"));
                    break StopReason::NoMoreActivity;
                }
                Err(err) => {
                    span.in_scope(|| error!(error = %err, "iteration failed"));
                    break StopReason::Failed(err);
                }
            }

            let pause = self.options.pacing.pick(&mut self.rng);
            debug!(secs = pause.as_secs(), "pausing");
            if shutdown.sleep(pause).await == SleepOutcome::Interrupted {
                break StopReason::Cancelled;
            }
        };

        info!(%stats, stop = ?stop, "session finished");
        SessionReport { stats, stop }
    }

    fn check_wiring(&self) -> Result<(), SessionError> {
        if self.options.use_llm && self.oracle.is_none() {
            return Err(SessionError::MissingOracle);
        }
        if self.options.use_cache && self.cache.is_none() {
            return Err(SessionError::MissingCache);
        }
        Ok(())
    }

    async fn iterate(&mut self, stats: &mut SessionStats) -> Result<Flow, SessionError> {
        let exercise = self.platform.next_question(&self.scope).await?;
        let activity = exercise.activity_id;
        Span::current().record("question_id", activity.value());

        let attempt = self.platform.acquire_attempt(&self.scope, activity).await?;
        Span::current().record("attempt_id", attempt.value());

        if exercise.is_lesson() {
            self.platform
                .complete_lesson(&self.scope, activity, attempt)
                .await?;
            stats.record_lesson();
            info!("lesson completed");
            return Ok(Flow::Continue);
        }

        let chosen = self.decide(&exercise, stats).await?;
        let verdict = self
            .platform
            .submit_answer(&self.scope, &Submission::first(activity, attempt, chosen))
            .await?;
        let right = verdict
            .right_answer()
            .ok_or(SessionError::MissingVerdict { activity })?;
        if verdict.attempt != attempt {
            Span::current().record("attempt_id", verdict.attempt.value());
        }

        // Count and learn the verdict before the correction can fail.
        let was_correct = chosen == right;
        stats.record_first_attempt(was_correct);
        info!(
            chosen = %chosen,
            right = %right,
            correct = stats.correct,
            wrong = stats.wrong,
            "answered"
        );
        self.remember(&exercise, right).await?;

        if !was_correct {
            self.platform
                .submit_answer(
                    &self.scope,
                    &Submission::correction(activity, verdict.attempt, right),
                )
                .await?;
        }
        Ok(self.check_mastery().await)
    }

    /// Cache first, then the oracle, then a uniform pick.
    async fn decide(
        &mut self,
        exercise: &Exercise,
        stats: &mut SessionStats,
    ) -> Result<AnswerId, SessionError> {
        if self.options.use_cache {
            if let Some(cache) = &self.cache {
                let key = self.scope.question_key(exercise.activity_id);
                if let Some(answer) = cache.lookup(&key).await? {
                    stats.record_cache_hit();
                    debug!(answer = %answer, "cache hit");
                    return Ok(answer);
                }
            }
        }

        if self.options.use_llm {
            if let Some(oracle) = &self.oracle {
                let answer = oracle.ask(exercise).await?;
                if !exercise.offers(answer) {
                    warn!(answer = %answer, "oracle picked an id that is not offered");
                }
                return Ok(answer);
            }
        }

        let picked = pick_random(exercise, &mut self.rng)?;
        debug!(answer = %picked, "picked at random");
        Ok(picked)
    }

    async fn remember(&self, exercise: &Exercise, right: AnswerId) -> Result<(), SessionError> {
        if !self.options.use_cache {
            return Ok(());
        }
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        cache
            .record(CachedQuestion {
                key: self.scope.question_key(exercise.activity_id),
                content: exercise.to_string(),
                right_answer: right,
            })
            .await?;
        Ok(())
    }

    async fn check_mastery(&self) -> Flow {
        let mastery = match self.platform.list_modules(self.scope.course).await {
            Ok(modules) => mastery_of(&modules, self.scope.module),
            Err(err) => {
                warn!(error = %err, "mastery refresh failed");
                return Flow::Continue;
            }
        };
        let Some(mastery) = mastery else {
            warn!("module missing from listing, mastery unknown");
            return Flow::Continue;
        };
        info!(%mastery, "mastery refreshed");

        match self.options.mastery_cap {
            Some(cap) if mastery.reaches(cap) => Flow::Stop(StopReason::MasteryReached(mastery)),
            _ => Flow::Continue,
        }
    }
}

fn pick_random(exercise: &Exercise, rng: &mut StdRng) -> Result<AnswerId, SessionError> {
    exercise
        .possible_answers
        .choose(rng)
        .map(|a| a.answer_id)
        .ok_or(SessionError::NoChoices {
            activity: exercise.activity_id,
        })
}
