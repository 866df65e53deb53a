use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

use drill_core::model::{
    ActivityId, AnswerId, AttemptId, CourseId, Course, Exercise, LearningScope, Mastery, Module,
    ModuleId, PossibleAnswer, Subject, SubjectId,
};
use services::error::{OracleError, PlatformError, SessionError};
use services::oracle::AnswerOracle;
use services::pacing::{Pacing, Shutdown};
use services::platform::{LearningPlatform, Submission, SubmissionKind, Verdict};
use services::session::{SessionDriver, SessionOptions, StopReason};
use storage::repository::{AnswerCache, CachedQuestion, CatalogRepository, InMemoryRepository};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    NextQuestion,
    Acquire(ActivityId),
    Submit(Submission),
    CompleteLesson(ActivityId, AttemptId),
    ListModules,
}

/// Platform double that replays a question script and logs every call.
#[derive(Default)]
struct FakePlatform {
    questions: Mutex<VecDeque<Exercise>>,
    right: HashMap<ActivityId, Vec<AnswerId>>,
    masteries: Mutex<VecDeque<f64>>,
    reject_corrections: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakePlatform {
    fn new(questions: Vec<Exercise>) -> Self {
        Self {
            questions: Mutex::new(questions.into()),
            ..Self::default()
        }
    }

    fn with_right(mut self, activity: u64, answer: u64) -> Self {
        self.right
            .insert(ActivityId::new(activity), vec![AnswerId::new(answer)]);
        self
    }

    fn with_masteries(self, values: &[f64]) -> Self {
        *self.masteries.lock().unwrap() = values.iter().copied().collect();
        self
    }

    fn rejecting_corrections(mut self) -> Self {
        self.reject_corrections = true;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn submissions(&self) -> Vec<Submission> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| wanted(c)).count()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LearningPlatform for FakePlatform {
    async fn list_available(&self) -> Result<Vec<Subject>, PlatformError> {
        Ok(vec![Subject {
            id: SubjectId::new(3),
            name: "Math".into(),
            courses: vec![Course {
                id: CourseId::new(2274),
                name: "Analysis".into(),
            }],
        }])
    }

    async fn list_modules(&self, _course: CourseId) -> Result<Vec<Module>, PlatformError> {
        self.log(Call::ListModules);
        let mastery = self.masteries.lock().unwrap().pop_front().unwrap_or(0.1);
        Ok(vec![Module {
            id: ModuleId::new(12),
            name: "Limits".into(),
            mastery: Mastery::new(mastery).unwrap(),
        }])
    }

    async fn next_question(&self, _scope: &LearningScope) -> Result<Exercise, PlatformError> {
        self.log(Call::NextQuestion);
        self.questions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(PlatformError::NoMoreActivity)
    }

    async fn acquire_attempt(
        &self,
        _scope: &LearningScope,
        activity: ActivityId,
    ) -> Result<AttemptId, PlatformError> {
        self.log(Call::Acquire(activity));
        Ok(AttemptId::new(activity.value() * 10))
    }

    async fn submit_answer(
        &self,
        _scope: &LearningScope,
        submission: &Submission,
    ) -> Result<Verdict, PlatformError> {
        self.log(Call::Submit(submission.clone()));
        if submission.is_correction() && self.reject_corrections {
            return Err(PlatformError::Config("correction rejected".into()));
        }
        let right_answer_ids = if submission.is_correction() {
            Vec::new()
        } else {
            self.right
                .get(&submission.activity)
                .cloned()
                .unwrap_or_default()
        };
        Ok(Verdict {
            right_answer_ids,
            attempt: submission.attempt,
        })
    }

    async fn complete_lesson(
        &self,
        _scope: &LearningScope,
        activity: ActivityId,
        attempt: AttemptId,
    ) -> Result<(), PlatformError> {
        self.log(Call::CompleteLesson(activity, attempt));
        Ok(())
    }
}

/// Oracle double returning a fixed answer, or rate limiting when `None`.
struct FakeOracle {
    answer: Option<AnswerId>,
    asked: Mutex<u32>,
}

impl FakeOracle {
    fn answering(answer: u64) -> Self {
        Self {
            answer: Some(AnswerId::new(answer)),
            asked: Mutex::new(0),
        }
    }

    fn rate_limited() -> Self {
        Self {
            answer: None,
            asked: Mutex::new(0),
        }
    }

    fn asked(&self) -> u32 {
        *self.asked.lock().unwrap()
    }
}

#[async_trait]
impl AnswerOracle for FakeOracle {
    async fn ask(&self, _exercise: &Exercise) -> Result<AnswerId, OracleError> {
        *self.asked.lock().unwrap() += 1;
        self.answer.ok_or(OracleError::RateLimited)
    }
}

fn scope() -> LearningScope {
    LearningScope::new(SubjectId::new(3), CourseId::new(2274), ModuleId::new(12))
}

fn question(activity: u64, answers: &[u64]) -> Exercise {
    Exercise {
        activity_id: ActivityId::new(activity),
        content: format!("<p>question {activity}</p>"),
        possible_answers: answers
            .iter()
            .map(|id| PossibleAnswer {
                answer_id: AnswerId::new(*id),
                is_correct: false,
                text: format!("choice {id}"),
            })
            .collect(),
    }
}

fn lesson(activity: u64) -> Exercise {
    question(activity, &[])
}

fn options() -> SessionOptions {
    SessionOptions::default().with_pacing(Pacing::none())
}

fn driver(platform: &Arc<FakePlatform>, options: SessionOptions) -> SessionDriver {
    SessionDriver::new(platform.clone(), scope(), options).with_rng(StdRng::seed_from_u64(42))
}

#[tokio::test]
async fn lesson_is_completed_without_deciding_or_submitting() {
    let platform = Arc::new(FakePlatform::new(vec![lesson(7)]));
    let oracle = Arc::new(FakeOracle::answering(1));
    let cache = Arc::new(InMemoryRepository::new());
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options().with_cache(true))
        .with_oracle(oracle.clone())
        .with_cache(cache.clone())
        .run(&shutdown)
        .await;

    assert!(matches!(report.stop, StopReason::NoMoreActivity));
    assert_eq!(report.stats.lessons_completed, 1);
    assert_eq!(report.stats.total_answered(), 0);
    assert_eq!(oracle.asked(), 0);
    assert_eq!(cache.question_count().unwrap(), 0);
    assert_eq!(
        platform.calls(),
        vec![
            Call::NextQuestion,
            Call::Acquire(ActivityId::new(7)),
            Call::CompleteLesson(ActivityId::new(7), AttemptId::new(70)),
            Call::NextQuestion,
        ]
    );
}

#[tokio::test]
async fn wrong_answer_sends_exactly_one_correction() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]).with_right(5, 251));
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options())
        .with_oracle(Arc::new(FakeOracle::answering(250)))
        .run(&shutdown)
        .await;

    assert_eq!(report.stats.wrong, 1);
    assert_eq!(report.stats.correct, 0);
    let submissions = platform.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].kind, SubmissionKind::First);
    assert_eq!(submissions[0].answers, vec![AnswerId::new(250)]);
    assert_eq!(
        submissions[1],
        Submission::correction(ActivityId::new(5), AttemptId::new(50), AnswerId::new(251))
    );
}

#[tokio::test]
async fn right_answer_sends_no_correction() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]).with_right(5, 251));
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options())
        .with_oracle(Arc::new(FakeOracle::answering(251)))
        .run(&shutdown)
        .await;

    assert_eq!(report.stats.correct, 1);
    assert_eq!(report.stats.wrong, 0);
    assert_eq!(platform.submissions().len(), 1);
    assert_eq!(platform.count(|c| matches!(c, Call::ListModules)), 1);
}

#[tokio::test]
async fn mastery_cap_stops_before_next_question() {
    let platform = Arc::new(
        FakePlatform::new(vec![
            question(1, &[10, 11]),
            question(2, &[20, 21]),
            question(3, &[30, 31]),
        ])
        .with_right(1, 10)
        .with_right(2, 20)
        .with_right(3, 30)
        .with_masteries(&[0.5, 0.9]),
    );
    let (_handle, shutdown) = Shutdown::channel();
    let cap = Mastery::new(0.85).unwrap();

    let report = driver(&platform, options().with_llm(false).with_mastery_cap(Some(cap)))
        .run(&shutdown)
        .await;

    match report.stop {
        StopReason::MasteryReached(m) => assert_eq!(m.value(), 0.9),
        other => panic!("unexpected stop: {other:?}"),
    }
    assert_eq!(platform.count(|c| matches!(c, Call::NextQuestion)), 2);
    assert_eq!(report.stats.total_answered(), 2);
}

#[tokio::test]
async fn cache_hit_bypasses_oracle() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]).with_right(5, 251));
    let oracle = Arc::new(FakeOracle::answering(250));
    let cache = Arc::new(InMemoryRepository::new());
    cache
        .record(CachedQuestion {
            key: scope().question_key(ActivityId::new(5)),
            content: "question 5".into(),
            right_answer: AnswerId::new(251),
        })
        .await
        .unwrap();
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options().with_cache(true))
        .with_oracle(oracle.clone())
        .with_cache(cache.clone())
        .run(&shutdown)
        .await;

    assert_eq!(oracle.asked(), 0);
    assert_eq!(report.stats.cache_hits, 1);
    assert_eq!(report.stats.correct, 1);
    assert_eq!(platform.submissions()[0].answers, vec![AnswerId::new(251)]);
}

#[tokio::test]
async fn cache_learns_right_answer_and_keeps_first_row() {
    let platform = Arc::new(
        FakePlatform::new(vec![question(5, &[250, 251]), question(5, &[250, 251])])
            .with_right(5, 251),
    );
    let oracle = Arc::new(FakeOracle::answering(250));
    let cache = Arc::new(InMemoryRepository::new());
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options().with_cache(true))
        .with_oracle(oracle.clone())
        .with_cache(cache.clone())
        .run(&shutdown)
        .await;

    // First sighting goes to the oracle and is learned; the repeat hits the cache.
    assert_eq!(oracle.asked(), 1);
    assert_eq!(report.stats.wrong, 1);
    assert_eq!(report.stats.correct, 1);
    assert_eq!(report.stats.cache_hits, 1);
    assert_eq!(cache.question_count().unwrap(), 1);
    assert_eq!(
        cache
            .lookup(&scope().question_key(ActivityId::new(5)))
            .await
            .unwrap(),
        Some(AnswerId::new(251))
    );
}

#[tokio::test]
async fn cache_stores_the_full_prompt_as_content() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]).with_right(5, 251));
    let cache = Arc::new(InMemoryRepository::new());
    let (_handle, shutdown) = Shutdown::channel();

    driver(&platform, options().with_cache(true))
        .with_oracle(Arc::new(FakeOracle::answering(251)))
        .with_cache(cache.clone())
        .run(&shutdown)
        .await;

    let row = cache
        .cached(&scope().question_key(ActivityId::new(5)))
        .unwrap()
        .unwrap();
    assert_eq!(row.content, question(5, &[250, 251]).to_string());
    assert!(row.content.contains("question 5"));
    assert!(row.content.contains("choice 250"));
}

#[tokio::test]
async fn failed_correction_still_counts_the_miss_and_learns_the_answer() {
    let platform = Arc::new(
        FakePlatform::new(vec![question(5, &[250, 251])])
            .with_right(5, 251)
            .rejecting_corrections(),
    );
    let cache = Arc::new(InMemoryRepository::new());
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options().with_cache(true))
        .with_oracle(Arc::new(FakeOracle::answering(250)))
        .with_cache(cache.clone())
        .run(&shutdown)
        .await;

    assert!(matches!(
        report.stop,
        StopReason::Failed(SessionError::Platform(PlatformError::Config(_)))
    ));
    assert_eq!(report.stats.wrong, 1);
    assert_eq!(report.stats.correct, 0);
    assert_eq!(platform.submissions().len(), 2);
    assert_eq!(
        cache
            .lookup(&scope().question_key(ActivityId::new(5)))
            .await
            .unwrap(),
        Some(AnswerId::new(251))
    );
}

/// Shared buffer the fmt subscriber writes into.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn failure_is_logged_inside_the_iteration_span() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    // Current-thread runtime, so the thread-local default covers the whole run.
    let _guard = tracing::subscriber::set_default(subscriber);

    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]));
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options().with_llm(false))
        .run(&shutdown)
        .await;
    assert!(report.stop.is_failure());

    let logs = captured.text();
    let line = logs
        .lines()
        .find(|l| l.contains("iteration failed"))
        .unwrap_or_else(|| panic!("no failure line in:\n{logs}"));
    assert!(line.contains("question_id=5"), "{line}");
    assert!(line.contains("attempt_id=50"), "{line}");
    assert!(line.contains("course_id=2274"), "{line}");
}

#[tokio::test]
async fn prepare_registers_catalog_rows_with_names() {
    let platform = Arc::new(FakePlatform::new(vec![]));
    let repo = InMemoryRepository::new();

    driver(&platform, options().with_cache(true))
        .prepare(Some(&repo as &dyn CatalogRepository))
        .await
        .unwrap();

    let subjects = repo.catalog_snapshot().unwrap();
    assert_eq!(subjects[0].name, "Math");
    assert_eq!(subjects[0].courses[0].name, "Analysis");
    assert_eq!(repo.modules_of(CourseId::new(2274)).unwrap()[0].name, "Limits");
}

#[tokio::test]
async fn triggered_shutdown_cancels_before_any_call() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250])]));
    let (handle, shutdown) = Shutdown::channel();
    handle.trigger();

    let report = driver(&platform, options().with_llm(false))
        .run(&shutdown)
        .await;

    assert!(matches!(report.stop, StopReason::Cancelled));
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn rate_limited_oracle_fails_session() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]).with_right(5, 251));
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options())
        .with_oracle(Arc::new(FakeOracle::rate_limited()))
        .run(&shutdown)
        .await;

    assert!(matches!(
        report.stop,
        StopReason::Failed(SessionError::Oracle(OracleError::RateLimited))
    ));
    assert!(platform.submissions().is_empty());
}

#[tokio::test]
async fn empty_verdict_fails_session() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250, 251])]));
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options().with_llm(false))
        .run(&shutdown)
        .await;

    match report.stop {
        StopReason::Failed(SessionError::MissingVerdict { activity }) => {
            assert_eq!(activity, ActivityId::new(5));
        }
        other => panic!("unexpected stop: {other:?}"),
    }
}

#[tokio::test]
async fn missing_collaborators_fail_fast() {
    let platform = Arc::new(FakePlatform::new(vec![question(5, &[250])]));
    let (_handle, shutdown) = Shutdown::channel();

    let report = driver(&platform, options()).run(&shutdown).await;
    assert!(matches!(
        report.stop,
        StopReason::Failed(SessionError::MissingOracle)
    ));

    let report = driver(&platform, options().with_llm(false).with_cache(true))
        .run(&shutdown)
        .await;
    assert!(matches!(
        report.stop,
        StopReason::Failed(SessionError::MissingCache)
    ));
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn random_choice_picks_an_offered_answer() {
    let platform = Arc::new(
        FakePlatform::new(vec![question(5, &[250, 251, 252])]).with_right(5, 252),
    );
    let (_handle, shutdown) = Shutdown::channel();

    driver(&platform, options().with_llm(false))
        .run(&shutdown)
        .await;

    let first = &platform.submissions()[0];
    assert!([250, 251, 252].map(AnswerId::new).contains(&first.answers[0]));
}
