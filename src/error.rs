use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::data::{CourseId, RoomId, TimeSlotId, UserId};
use crate::exam::ExamId;

/// Failures of the storage layer behind the repository traits.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Faults that abort a whole generation run.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("teacher {teacher_id} is already booked at time slot {time_slot_id}")]
    TeacherDoubleBooked {
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
    },

    #[error("room {room_id} is already booked at time slot {time_slot_id}")]
    RoomDoubleBooked {
        room_id: RoomId,
        time_slot_id: TimeSlotId,
    },

    #[error("room {room_id} seats {capacity} but course {course_id} has {enrolled} students")]
    CapacityExceeded {
        room_id: RoomId,
        course_id: CourseId,
        capacity: u32,
        enrolled: u32,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    #[error("exam with id {0} not found")]
    ExamNotFound(ExamId),

    #[error("Exam is not published.")]
    NotPublished,

    #[error("Exam has not started yet.")]
    NotStarted,

    #[error("Exam has ended.")]
    Ended,

    #[error("Exam already submitted.")]
    AlreadySubmitted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Error type for HTTP handlers. Renders as a JSON `{error, code}` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Grading(#[from] GradingError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Store(StoreError::Constraint(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Store(StoreError::Unavailable(msg)) => {
                log::error!("storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Grading(err) => match err {
                GradingError::ExamNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                GradingError::NotPublished
                | GradingError::NotStarted
                | GradingError::Ended
                | GradingError::AlreadySubmitted => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
                }
                GradingError::Store(store) => {
                    log::error!("storage error during grading: {store}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
