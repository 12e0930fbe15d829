//! Auto-grading of objective exam questions.
//!
//! Multiple-choice answers are all-or-nothing: the selected options must be
//! exactly the options flagged correct. Free-text answers are left for a human
//! grader and never contribute obtained marks.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::exam::{Exam, GradingResult, Question, QuestionId, StudentAnswer};

/// What `Exam::passing_marks` is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassMarkMode {
    /// `percentage >= passing_marks`.
    #[default]
    Percentage,
    /// `marks_obtained >= passing_marks`.
    Marks,
}

/// Whether ungraded free-text questions count toward `marks_possible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UngradedMarks {
    #[default]
    Count,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingPolicy {
    pub pass_mark: PassMarkMode,
    pub ungraded_marks: UngradedMarks,
}

impl FromStr for PassMarkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(PassMarkMode::Percentage),
            "marks" => Ok(PassMarkMode::Marks),
            _ => Err("expected `percentage` or `marks`".to_string()),
        }
    }
}

impl FromStr for UngradedMarks {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(UngradedMarks::Count),
            "exclude" => Ok(UngradedMarks::Exclude),
            _ => Err("expected `count` or `exclude`".to_string()),
        }
    }
}

/// Grades every answer in place and returns the totals.
///
/// Answers whose question is missing from `questions`, or whose marks would
/// overflow the totals, contribute nothing and are left ungraded. An MCQ whose answer key is empty is
/// graded wrong.
pub fn grade(
    exam: &Exam,
    questions: &[Question],
    answers: &mut [StudentAnswer],
    policy: &GradingPolicy,
) -> GradingResult {
    let by_id: HashMap<QuestionId, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut marks_obtained = 0u32;
    let mut marks_possible = 0u32;

    for answer in answers.iter_mut() {
        let Some(question) = by_id.get(&answer.question_id) else {
            log::warn!(
                "Answer of student {} refers to unknown question {} in exam {}.",
                answer.student_id,
                answer.question_id,
                exam.id
            );
            continue;
        };

        if question.question_type.is_auto_graded() {
            let answer_key = question.correct_option_ids();
            let correct = !answer_key.is_empty() && answer_key == answer.selected_option_ids;
            let earned = if correct { question.marks } else { 0 };
            let (Some(possible), Some(obtained)) = (
                marks_possible.checked_add(question.marks),
                marks_obtained.checked_add(earned),
            ) else {
                warn_overflow(exam, answer);
                answer.is_correct = None;
                answer.marks_obtained = None;
                continue;
            };
            marks_possible = possible;
            marks_obtained = obtained;
            answer.is_correct = Some(correct);
            answer.marks_obtained = Some(earned);
        } else {
            if policy.ungraded_marks == UngradedMarks::Count {
                let Some(possible) = marks_possible.checked_add(question.marks) else {
                    warn_overflow(exam, answer);
                    answer.is_correct = None;
                    answer.marks_obtained = None;
                    continue;
                };
                marks_possible = possible;
            }
            answer.is_correct = None;
            answer.marks_obtained = None;
        }
    }

    let percentage = if marks_possible > 0 {
        f64::from(marks_obtained) / f64::from(marks_possible) * 100.0
    } else {
        0.0
    };
    let passed = match policy.pass_mark {
        PassMarkMode::Percentage => percentage >= f64::from(exam.passing_marks),
        PassMarkMode::Marks => marks_obtained >= exam.passing_marks,
    };

    GradingResult {
        marks_obtained,
        marks_possible,
        percentage: round_percentage(percentage),
        passed,
    }
}

fn warn_overflow(exam: &Exam, answer: &StudentAnswer) {
    log::warn!(
        "Marks of question {} overflow the totals of exam {}, skipping it for student {}.",
        answer.question_id,
        exam.id,
        answer.student_id
    );
}

/// Two decimal places, as stored.
fn round_percentage(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
