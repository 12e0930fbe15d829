use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::ServerConfig;
use crate::data::{EntryView, Room, ScheduleGenerationLog, SchedulingKey, TimeSlot, UserId};
use crate::error::{AppError, AppResult};
use crate::exam::{AnswerSubmission, AutoGradingResult, ExamId};
use crate::service::{ExamService, TimetableFilter, TimetableService};
use crate::store::{CatalogReader, ExamStore, GenerationLogStore, TimetableStore};

/// Everything the handlers need from storage.
pub trait AppStore:
    CatalogReader + TimetableStore + GenerationLogStore + ExamStore + 'static
{
}

impl<S> AppStore for S where
    S: CatalogReader + TimetableStore + GenerationLogStore + ExamStore + 'static
{
}

/// Shared handler state. Cheap to clone.
pub struct AppState<S> {
    pub timetable: Arc<TimetableService<S>>,
    pub exams: Arc<ExamService<S>>,
    pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            timetable: Arc::clone(&self.timetable),
            exams: Arc::clone(&self.exams),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: AppStore> AppState<S> {
    pub fn new(config: ServerConfig, store: Arc<S>) -> Self {
        Self {
            timetable: Arc::new(TimetableService::new(Arc::clone(&store))),
            exams: Arc::new(ExamService::new(store, config.grading)),
            config: Arc::new(config),
        }
    }
}

/// Every field is optional; the key falls back to the configured default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    semester: Option<u32>,
    academic_year: Option<String>,
    actor_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimetableQuery {
    semester: Option<u32>,
    academic_year: Option<String>,
    teacher_id: Option<UserId>,
    student_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    student_id: UserId,
    #[serde(default)]
    answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultsQuery {
    student_id: Option<UserId>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate_handler<S: AppStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let defaults = &state.config.default_key;
    let academic_year = request
        .academic_year
        .unwrap_or_else(|| defaults.academic_year.clone());
    if academic_year.trim().is_empty() {
        return Err(AppError::BadRequest("academicYear must not be empty".to_string()));
    }
    let key = SchedulingKey::new(request.semester.unwrap_or(defaults.semester), academic_year);

    let run = state.timetable.generate(key, request.actor_id).await?;

    if run.result.is_fault() {
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Timetable generation failed.",
                "log": run.log,
            })),
        ));
    }

    let timetable = state.timetable.render(&run.result.entries)?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Timetable generation completed.",
            "log": run.log,
            "timetable": timetable,
        })),
    ))
}

async fn timetable_handler<S: AppStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<TimetableQuery>,
) -> AppResult<Json<Vec<EntryView>>> {
    let filter = TimetableFilter {
        semester: query.semester,
        academic_year: query.academic_year,
        teacher_id: query.teacher_id,
        student_id: query.student_id,
    };
    let entries = state.timetable.timetable(&filter)?;
    Ok(Json(state.timetable.render(&entries)?))
}

async fn generation_logs_handler<S: AppStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<Vec<ScheduleGenerationLog>>> {
    Ok(Json(state.timetable.generation_logs()?))
}

async fn rooms_handler<S: AppStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(state.timetable.store().rooms()?))
}

async fn time_slots_handler<S: AppStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<Vec<TimeSlot>>> {
    Ok(Json(state.timetable.store().time_slots()?))
}

async fn submit_handler<S: AppStore>(
    State(state): State<AppState<S>>,
    Path(exam_id): Path<ExamId>,
    Json(request): Json<SubmitRequest>,
) -> AppResult<Json<Value>> {
    let result = state
        .exams
        .submit(exam_id, request.student_id, request.answers, Utc::now())
        .await?;
    Ok(Json(json!({
        "message": "Exam submitted successfully.",
        "result": result,
    })))
}

async fn grade_handler<S: AppStore>(
    State(state): State<AppState<S>>,
    Path((exam_id, student_id)): Path<(ExamId, UserId)>,
) -> AppResult<Json<AutoGradingResult>> {
    Ok(Json(state.exams.grade(exam_id, student_id).await?))
}

async fn results_handler<S: AppStore>(
    State(state): State<AppState<S>>,
    Path(exam_id): Path<ExamId>,
    Query(query): Query<ResultsQuery>,
) -> AppResult<Json<Value>> {
    match query.student_id {
        Some(student_id) => match state.exams.result(exam_id, student_id)? {
            Some(result) => Ok(Json(json!(result))),
            None => Err(AppError::NotFound("Results not available yet.".to_string())),
        },
        None => Ok(Json(json!(state.exams.results(exam_id)?))),
    }
}

pub fn router<S: AppStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/timetable", get(timetable_handler::<S>))
        .route("/v1/timetable/generate", post(generate_handler::<S>))
        .route("/v1/timetable/generation-logs", get(generation_logs_handler::<S>))
        .route("/v1/rooms", get(rooms_handler::<S>))
        .route("/v1/time-slots", get(time_slots_handler::<S>))
        .route("/v1/exams/:exam_id/submit", post(submit_handler::<S>))
        .route("/v1/exams/:exam_id/grade/:student_id", post(grade_handler::<S>))
        .route("/v1/exams/:exam_id/results", get(results_handler::<S>))
        .with_state(state)
}

pub async fn run_server<S: AppStore>(
    config: ServerConfig,
    store: Arc<S>,
) -> std::io::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
