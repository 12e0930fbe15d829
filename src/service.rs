//! Entry points wrapping the algorithms with locking, persistence and audit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;

use crate::audit;
use crate::data::{
    EntryView, GenerationResult, ScheduleGenerationLog, SchedulingKey, TimeSlot, TimetableEntry,
    UserId,
};
use crate::error::{GradingError, ScheduleError, StoreResult};
use crate::exam::{
    AnswerSubmission, AutoGradingResult, ExamId, GradingResult, QuestionId, StudentAnswer,
};
use crate::grading::{self, GradingPolicy};
use crate::locks::KeyedLocks;
use crate::solver;
use crate::store::{CatalogReader, ExamStore, GenerationLogStore, TimetableStore};

/// A finished generation attempt and the audit row it produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRun {
    pub result: GenerationResult,
    pub log: ScheduleGenerationLog,
}

/// Which entries a timetable listing shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimetableFilter {
    pub semester: Option<u32>,
    pub academic_year: Option<String>,
    /// Only entries taught by this teacher.
    pub teacher_id: Option<UserId>,
    /// Only entries of courses this student is enrolled in.
    pub student_id: Option<UserId>,
}

pub struct TimetableService<S> {
    store: Arc<S>,
    locks: KeyedLocks<SchedulingKey>,
}

impl<S> TimetableService<S>
where
    S: CatalogReader + TimetableStore + GenerationLogStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// Regenerates the timetable of `key` and records the attempt.
    ///
    /// Runs for the same key are serialized. A run that faults keeps the
    /// previous timetable and comes back as a `failed` result carrying the
    /// error. Only a failure to write the audit row is returned as `Err`.
    pub async fn generate(
        &self,
        key: SchedulingKey,
        actor: Option<UserId>,
    ) -> StoreResult<GenerationRun> {
        let _guard = self.locks.lock(&key).await;
        info!("Timetable generation for {} requested by {:?}.", key, actor);

        let result = match self.run(&key) {
            Ok(result) => result,
            Err(err) => {
                error!("Timetable generation for {} aborted: {}", key, err);
                GenerationResult::failed(err.to_string())
            }
        };

        let log = audit::record(self.store.as_ref(), actor, &result)?;
        Ok(GenerationRun { result, log })
    }

    /// Snapshot, sweep, then swap the key's entries in one store call.
    fn run(&self, key: &SchedulingKey) -> Result<GenerationResult, ScheduleError> {
        let catalog = self.store.snapshot()?;
        let outcome = solver::generate(key, &catalog)?;
        let entries = self.store.replace_entries(key, outcome.entries)?;

        Ok(GenerationResult {
            status: outcome.status,
            courses_scheduled: outcome.courses_scheduled,
            conflicts_found: outcome.conflicts_found,
            conflicts_resolved: outcome.conflicts_resolved,
            entries,
            error_message: None,
        })
    }

    /// Entries matching `filter`, ordered by time slot.
    pub fn timetable(&self, filter: &TimetableFilter) -> StoreResult<Vec<TimetableEntry>> {
        let catalog = self.store.snapshot()?;
        let entries = match (filter.semester, &filter.academic_year) {
            (Some(semester), Some(year)) => {
                self.store.entries(&SchedulingKey::new(semester, year.clone()))?
            }
            _ => self.store.all_entries()?,
        };

        let mut entries: Vec<TimetableEntry> = entries
            .into_iter()
            .filter(|e| filter.semester.is_none_or(|s| e.semester == s))
            .filter(|e| {
                filter
                    .academic_year
                    .as_ref()
                    .is_none_or(|y| &e.academic_year == y)
            })
            .filter(|e| filter.teacher_id.is_none_or(|t| e.teacher_id == t))
            .filter(|e| {
                filter.student_id.is_none_or(|s| {
                    catalog
                        .course(e.course_id)
                        .is_some_and(|c| c.is_enrolled(s))
                })
            })
            .collect();

        entries.sort_by_key(|e| {
            (
                catalog.time_slot(e.time_slot_id).map(TimeSlot::canonical_key),
                e.id,
            )
        });
        Ok(entries)
    }

    /// Display rows for `entries`, resolved against the current catalog.
    pub fn render(&self, entries: &[TimetableEntry]) -> StoreResult<Vec<EntryView>> {
        let catalog = self.store.snapshot()?;
        Ok(entries.iter().map(|e| catalog.render(e)).collect())
    }

    pub fn generation_logs(&self) -> StoreResult<Vec<ScheduleGenerationLog>> {
        self.store.logs()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

pub struct ExamService<S> {
    store: Arc<S>,
    policy: GradingPolicy,
    locks: KeyedLocks<(ExamId, UserId)>,
}

impl<S: ExamStore> ExamService<S> {
    pub fn new(store: Arc<S>, policy: GradingPolicy) -> Self {
        Self {
            store,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// Records a student's answers and grades them.
    ///
    /// The exam must be published and open at `now`. Unless the exam allows
    /// retakes, a student who already answered is turned away. Answers to
    /// questions outside the exam are dropped.
    pub async fn submit(
        &self,
        exam_id: ExamId,
        student_id: UserId,
        submissions: Vec<AnswerSubmission>,
        now: DateTime<Utc>,
    ) -> Result<GradingResult, GradingError> {
        let _guard = self.locks.lock(&(exam_id, student_id)).await;

        let exam = self
            .store
            .exam(exam_id)?
            .ok_or(GradingError::ExamNotFound(exam_id))?;
        if !exam.is_published {
            return Err(GradingError::NotPublished);
        }
        if now < exam.start_time {
            return Err(GradingError::NotStarted);
        }
        if now > exam.end_time {
            return Err(GradingError::Ended);
        }

        let existing = self.store.answers(exam_id, student_id)?;
        if !exam.allow_retake && !existing.is_empty() {
            return Err(GradingError::AlreadySubmitted);
        }

        let question_ids: Vec<QuestionId> = self
            .store
            .questions(exam_id)?
            .iter()
            .map(|q| q.id)
            .collect();
        let answers: Vec<StudentAnswer> = submissions
            .into_iter()
            .filter(|s| question_ids.contains(&s.question_id))
            .map(|s| StudentAnswer {
                exam_id,
                student_id,
                question_id: s.question_id,
                answer_text: s.answer_text,
                selected_option_ids: s.selected_option_ids.into_iter().collect(),
                marks_obtained: None,
                is_correct: None,
                submitted_at: now,
            })
            .collect();
        self.store.save_answers(&answers)?;
        info!(
            "Student {} submitted {} answers for exam {}.",
            student_id,
            answers.len(),
            exam_id
        );

        self.grade_locked(exam_id, student_id, now)
            .map(|r| r.summary())
    }

    /// Regrades every stored answer of (exam, student).
    pub async fn grade(
        &self,
        exam_id: ExamId,
        student_id: UserId,
    ) -> Result<AutoGradingResult, GradingError> {
        let _guard = self.locks.lock(&(exam_id, student_id)).await;
        self.grade_locked(exam_id, student_id, Utc::now())
    }

    fn grade_locked(
        &self,
        exam_id: ExamId,
        student_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<AutoGradingResult, GradingError> {
        let exam = self
            .store
            .exam(exam_id)?
            .ok_or(GradingError::ExamNotFound(exam_id))?;
        let questions = self.store.questions(exam_id)?;
        let mut answers = self.store.answers(exam_id, student_id)?;

        let result = grading::grade(&exam, &questions, &mut answers, &self.policy);
        self.store.save_answers(&answers)?;

        let saved = self.store.upsert_grading_result(AutoGradingResult {
            exam_id,
            student_id,
            total_marks_obtained: result.marks_obtained,
            total_marks_possible: result.marks_possible,
            percentage: result.percentage,
            is_passed: result.passed,
            graded_at: now,
        })?;
        info!(
            "Graded exam {} for student {}: {}/{} ({}%), passed: {}.",
            exam_id,
            student_id,
            result.marks_obtained,
            result.marks_possible,
            result.percentage,
            result.passed
        );
        Ok(saved)
    }

    pub fn result(
        &self,
        exam_id: ExamId,
        student_id: UserId,
    ) -> StoreResult<Option<AutoGradingResult>> {
        self.store.grading_result(exam_id, student_id)
    }

    pub fn results(&self, exam_id: ExamId) -> StoreResult<Vec<AutoGradingResult>> {
        self.store.grading_results(exam_id)
    }
}
