//! Repository traits the core reads from and writes to, plus an in-memory
//! implementation used by the server and the tests.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::catalog::CatalogSnapshot;
use crate::data::{
    Course, EntryId, LogId, NewGenerationLog, NewTimetableEntry, Room, ScheduleCatalog,
    ScheduleGenerationLog, SchedulingKey, TimeSlot, TimetableEntry, UserId,
};
use crate::error::{StoreError, StoreResult};
use crate::exam::{AutoGradingResult, Exam, ExamId, Question, QuestionId, StudentAnswer};

/// Read side of the room, time-slot and course catalogs.
pub trait CatalogReader: Send + Sync {
    fn rooms(&self) -> StoreResult<Vec<Room>>;
    fn time_slots(&self) -> StoreResult<Vec<TimeSlot>>;
    fn courses(&self) -> StoreResult<Vec<Course>>;

    /// Reads every catalog once so a run works from a fixed view.
    fn snapshot(&self) -> StoreResult<ScheduleCatalog> {
        Ok(ScheduleCatalog {
            rooms: self.rooms()?,
            time_slots: self.time_slots()?,
            courses: self.courses()?,
        })
    }
}

pub trait TimetableStore: Send + Sync {
    fn entries(&self, key: &SchedulingKey) -> StoreResult<Vec<TimetableEntry>>;

    fn all_entries(&self) -> StoreResult<Vec<TimetableEntry>>;

    /// Deletes every entry of `key` and inserts `entries` as one atomic step.
    /// On error the previous entries of `key` are left untouched.
    fn replace_entries(
        &self,
        key: &SchedulingKey,
        entries: Vec<NewTimetableEntry>,
    ) -> StoreResult<Vec<TimetableEntry>>;
}

/// Append-only audit trail of generation attempts.
pub trait GenerationLogStore: Send + Sync {
    fn append_log(&self, log: NewGenerationLog) -> StoreResult<ScheduleGenerationLog>;

    /// Newest first.
    fn logs(&self) -> StoreResult<Vec<ScheduleGenerationLog>>;
}

pub trait ExamStore: Send + Sync {
    fn exam(&self, exam_id: ExamId) -> StoreResult<Option<Exam>>;

    /// Questions of an exam in display order, options included.
    fn questions(&self, exam_id: ExamId) -> StoreResult<Vec<Question>>;

    fn answers(&self, exam_id: ExamId, student_id: UserId) -> StoreResult<Vec<StudentAnswer>>;

    /// Inserts or replaces answers keyed by (exam, student, question).
    fn save_answers(&self, answers: &[StudentAnswer]) -> StoreResult<()>;

    /// Inserts or replaces the result of (exam, student).
    fn upsert_grading_result(&self, result: AutoGradingResult) -> StoreResult<AutoGradingResult>;

    fn grading_result(
        &self,
        exam_id: ExamId,
        student_id: UserId,
    ) -> StoreResult<Option<AutoGradingResult>>;

    fn grading_results(&self, exam_id: ExamId) -> StoreResult<Vec<AutoGradingResult>>;
}

#[derive(Debug, Default)]
struct Tables {
    rooms: Vec<Room>,
    time_slots: Vec<TimeSlot>,
    courses: Vec<Course>,
    timetable: Vec<TimetableEntry>,
    logs: Vec<ScheduleGenerationLog>,
    exams: Vec<Exam>,
    questions: Vec<Question>,
    answers: HashMap<(ExamId, UserId, QuestionId), StudentAnswer>,
    results: HashMap<(ExamId, UserId), AutoGradingResult>,
    next_entry_id: EntryId,
    next_log_id: LogId,
}

/// Everything behind one lock, so each trait call is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: CatalogSnapshot) -> Self {
        let CatalogSnapshot {
            rooms,
            time_slots,
            courses,
            exams,
            mut questions,
        } = catalog;
        questions.sort_by_key(|q| (q.exam_id, q.order, q.id));
        for question in &mut questions {
            question.options.sort_by_key(|o| (o.order, o.id));
        }

        Self {
            tables: RwLock::new(Tables {
                rooms,
                time_slots,
                courses,
                exams,
                questions,
                next_entry_id: 1,
                next_log_id: 1,
                ..Tables::default()
            }),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl CatalogReader for MemoryStore {
    /// Catalog order: by name.
    fn rooms(&self) -> StoreResult<Vec<Room>> {
        let mut rooms = self.read()?.rooms.clone();
        rooms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    fn time_slots(&self) -> StoreResult<Vec<TimeSlot>> {
        let mut slots = self.read()?.time_slots.clone();
        slots.sort_by_key(TimeSlot::canonical_key);
        Ok(slots)
    }

    fn courses(&self) -> StoreResult<Vec<Course>> {
        let mut courses = self.read()?.courses.clone();
        courses.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));
        Ok(courses)
    }
}

impl TimetableStore for MemoryStore {
    fn entries(&self, key: &SchedulingKey) -> StoreResult<Vec<TimetableEntry>> {
        Ok(self
            .read()?
            .timetable
            .iter()
            .filter(|e| key.matches(e.semester, &e.academic_year))
            .cloned()
            .collect())
    }

    fn all_entries(&self) -> StoreResult<Vec<TimetableEntry>> {
        Ok(self.read()?.timetable.clone())
    }

    fn replace_entries(
        &self,
        key: &SchedulingKey,
        entries: Vec<NewTimetableEntry>,
    ) -> StoreResult<Vec<TimetableEntry>> {
        let mut tables = self.write()?;

        if let Some(stray) = entries
            .iter()
            .find(|e| !key.matches(e.semester, &e.academic_year))
        {
            return Err(StoreError::Constraint(format!(
                "entry for course {} does not belong to {key}",
                stray.course_id
            )));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = tables.next_entry_id.max(1);
            tables.next_entry_id = id + 1;
            created.push(TimetableEntry {
                id,
                course_id: entry.course_id,
                teacher_id: entry.teacher_id,
                room_id: entry.room_id,
                time_slot_id: entry.time_slot_id,
                semester: entry.semester,
                academic_year: entry.academic_year,
                created_at: now,
            });
        }

        tables
            .timetable
            .retain(|e| !key.matches(e.semester, &e.academic_year));
        tables.timetable.extend(created.iter().cloned());
        Ok(created)
    }
}

impl GenerationLogStore for MemoryStore {
    fn append_log(&self, log: NewGenerationLog) -> StoreResult<ScheduleGenerationLog> {
        let mut tables = self.write()?;
        let id = tables.next_log_id.max(1);
        tables.next_log_id = id + 1;

        let row = ScheduleGenerationLog {
            id,
            generated_by: log.generated_by,
            status: log.status,
            courses_scheduled: log.courses_scheduled,
            conflicts_found: log.conflicts_found,
            conflicts_resolved: log.conflicts_resolved,
            error_message: log.error_message,
            generated_at: Utc::now(),
        };
        tables.logs.push(row.clone());
        Ok(row)
    }

    fn logs(&self) -> StoreResult<Vec<ScheduleGenerationLog>> {
        let mut logs = self.read()?.logs.clone();
        logs.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then(b.id.cmp(&a.id)));
        Ok(logs)
    }
}

impl ExamStore for MemoryStore {
    fn exam(&self, exam_id: ExamId) -> StoreResult<Option<Exam>> {
        Ok(self.read()?.exams.iter().find(|e| e.id == exam_id).cloned())
    }

    fn questions(&self, exam_id: ExamId) -> StoreResult<Vec<Question>> {
        Ok(self
            .read()?
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    fn answers(&self, exam_id: ExamId, student_id: UserId) -> StoreResult<Vec<StudentAnswer>> {
        let mut answers: Vec<StudentAnswer> = self
            .read()?
            .answers
            .values()
            .filter(|a| a.exam_id == exam_id && a.student_id == student_id)
            .cloned()
            .collect();
        answers.sort_by_key(|a| a.question_id);
        Ok(answers)
    }

    fn save_answers(&self, answers: &[StudentAnswer]) -> StoreResult<()> {
        let mut tables = self.write()?;
        for answer in answers {
            tables.answers.insert(
                (answer.exam_id, answer.student_id, answer.question_id),
                answer.clone(),
            );
        }
        Ok(())
    }

    fn upsert_grading_result(&self, result: AutoGradingResult) -> StoreResult<AutoGradingResult> {
        let mut tables = self.write()?;
        tables
            .results
            .insert((result.exam_id, result.student_id), result.clone());
        Ok(result)
    }

    fn grading_result(
        &self,
        exam_id: ExamId,
        student_id: UserId,
    ) -> StoreResult<Option<AutoGradingResult>> {
        Ok(self.read()?.results.get(&(exam_id, student_id)).cloned())
    }

    fn grading_results(&self, exam_id: ExamId) -> StoreResult<Vec<AutoGradingResult>> {
        let mut results: Vec<AutoGradingResult> = self
            .read()?
            .results
            .values()
            .filter(|r| r.exam_id == exam_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.graded_at.cmp(&a.graded_at).then(a.student_id.cmp(&b.student_id)));
        Ok(results)
    }
}
