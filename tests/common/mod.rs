use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use class_scheduler::catalog::CatalogSnapshot;
use class_scheduler::config::ServerConfig;
use class_scheduler::data::{
    Course, NewGenerationLog, NewTimetableEntry, Room, ScheduleGenerationLog, SchedulingKey,
    TimeSlot, TimetableEntry, UserId,
};
use class_scheduler::error::{StoreError, StoreResult};
use class_scheduler::exam::{AutoGradingResult, Exam, ExamId, Question, StudentAnswer};
use class_scheduler::server::{AppState, AppStore, router};
use class_scheduler::store::{
    CatalogReader, ExamStore, GenerationLogStore, MemoryStore, TimetableStore,
};

/// Router over any store.
pub fn build_app_with_store<S: AppStore>(store: Arc<S>) -> Router {
    router(AppState::new(ServerConfig::default(), store))
}

/// Router over an in-memory store seeded with `catalog`.
pub fn build_test_app(catalog: CatalogSnapshot) -> Router {
    build_app_with_store(Arc::new(MemoryStore::from_catalog(catalog)))
}

/// Router over the demo catalog.
pub fn build_demo_app() -> Router {
    build_test_app(CatalogSnapshot::demo(Utc::now()))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// In-memory store whose timetable writes fail while `fail_writes` is set.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(catalog: CatalogSnapshot) -> Self {
        Self {
            inner: MemoryStore::from_catalog(catalog),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl CatalogReader for FlakyStore {
    fn rooms(&self) -> StoreResult<Vec<Room>> {
        self.inner.rooms()
    }
    fn time_slots(&self) -> StoreResult<Vec<TimeSlot>> {
        self.inner.time_slots()
    }
    fn courses(&self) -> StoreResult<Vec<Course>> {
        self.inner.courses()
    }
}

impl TimetableStore for FlakyStore {
    fn entries(&self, key: &SchedulingKey) -> StoreResult<Vec<TimetableEntry>> {
        self.inner.entries(key)
    }
    fn all_entries(&self) -> StoreResult<Vec<TimetableEntry>> {
        self.inner.all_entries()
    }
    fn replace_entries(
        &self,
        key: &SchedulingKey,
        entries: Vec<NewTimetableEntry>,
    ) -> StoreResult<Vec<TimetableEntry>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.replace_entries(key, entries)
    }
}

impl GenerationLogStore for FlakyStore {
    fn append_log(&self, log: NewGenerationLog) -> StoreResult<ScheduleGenerationLog> {
        self.inner.append_log(log)
    }
    fn logs(&self) -> StoreResult<Vec<ScheduleGenerationLog>> {
        self.inner.logs()
    }
}

impl ExamStore for FlakyStore {
    fn exam(&self, exam_id: ExamId) -> StoreResult<Option<Exam>> {
        self.inner.exam(exam_id)
    }
    fn questions(&self, exam_id: ExamId) -> StoreResult<Vec<Question>> {
        self.inner.questions(exam_id)
    }
    fn answers(&self, exam_id: ExamId, student_id: UserId) -> StoreResult<Vec<StudentAnswer>> {
        self.inner.answers(exam_id, student_id)
    }
    fn save_answers(&self, answers: &[StudentAnswer]) -> StoreResult<()> {
        self.inner.save_answers(answers)
    }
    fn upsert_grading_result(&self, result: AutoGradingResult) -> StoreResult<AutoGradingResult> {
        self.inner.upsert_grading_result(result)
    }
    fn grading_result(
        &self,
        exam_id: ExamId,
        student_id: UserId,
    ) -> StoreResult<Option<AutoGradingResult>> {
        self.inner.grading_result(exam_id, student_id)
    }
    fn grading_results(&self, exam_id: ExamId) -> StoreResult<Vec<AutoGradingResult>> {
        self.inner.grading_results(exam_id)
    }
}
