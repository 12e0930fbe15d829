use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data::{CourseId, UserId};

pub type ExamId = u32;
pub type QuestionId = u32;
pub type OptionId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: ExamId,
    pub title: String,
    pub course_id: CourseId,
    pub teacher_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub max_marks: u32,
    /// Compared against the graded percentage unless the pass policy says otherwise.
    pub passing_marks: u32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub allow_retake: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    ShortAnswer,
    LongAnswer,
}

impl QuestionType {
    /// Short and long answers wait for a human grader.
    pub fn is_auto_graded(&self) -> bool {
        matches!(self, QuestionType::Mcq)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub exam_id: ExamId,
    pub text: String,
    pub question_type: QuestionType,
    pub marks: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// The answer key: ids of every option flagged correct.
    pub fn correct_option_ids(&self) -> BTreeSet<OptionId> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect()
    }
}

/// A student's answer to one question of one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnswer {
    pub exam_id: ExamId,
    pub student_id: UserId,
    pub question_id: QuestionId,
    pub answer_text: String,
    pub selected_option_ids: BTreeSet<OptionId>,
    /// `None` until graded.
    pub marks_obtained: Option<u32>,
    pub is_correct: Option<bool>,
    pub submitted_at: DateTime<Utc>,
}

/// One answer as sent by a student at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    #[serde(default)]
    pub answer_text: String,
    #[serde(default)]
    pub selected_option_ids: Vec<OptionId>,
}

/// Summary returned by a grading pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub marks_obtained: u32,
    pub marks_possible: u32,
    pub percentage: f64,
    pub passed: bool,
}

/// Persisted grading summary, one per (exam, student).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGradingResult {
    pub exam_id: ExamId,
    pub student_id: UserId,
    pub total_marks_obtained: u32,
    pub total_marks_possible: u32,
    pub percentage: f64,
    pub is_passed: bool,
    pub graded_at: DateTime<Utc>,
}

impl AutoGradingResult {
    pub fn summary(&self) -> GradingResult {
        GradingResult {
            marks_obtained: self.total_marks_obtained,
            marks_possible: self.total_marks_possible,
            percentage: self.percentage,
            passed: self.is_passed,
        }
    }
}
