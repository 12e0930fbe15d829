use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// Type aliases for clarity
pub type RoomId = u32;
pub type CourseId = u32;
pub type UserId = u32;
pub type TimeSlotId = u32;
pub type EntryId = u64;
pub type LogId = u64;

/// Day of the week. Declaration order is the canonical Monday..Sunday order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable room. The name is unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub building: String,
    /// Free-text facility tags, e.g. "projector, whiteboard".
    #[serde(default)]
    pub facilities: String,
}

/// A recurring weekly period. `(day, start_time, end_time)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeSlot {
    /// Sort key for the canonical slot order: day, then start, then end.
    pub fn canonical_key(&self) -> (Weekday, NaiveTime, NaiveTime, TimeSlotId) {
        (self.day, self.start_time, self.end_time, self.id)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// A course as seen by the scheduler: who teaches it and who is enrolled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    #[serde(default)]
    pub name: String,
    /// Unassigned courses cannot be scheduled.
    #[serde(default)]
    pub teacher_id: Option<UserId>,
    #[serde(default)]
    pub student_ids: BTreeSet<UserId>,
}

impl Course {
    pub fn enrolled_count(&self) -> u32 {
        self.student_ids.len() as u32
    }

    pub fn has_enrollment(&self) -> bool {
        !self.student_ids.is_empty()
    }

    pub fn is_enrolled(&self, student_id: UserId) -> bool {
        self.student_ids.contains(&student_id)
    }
}

/// The `(semester, academic_year)` pair that scopes one timetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingKey {
    pub semester: u32,
    pub academic_year: String,
}

impl SchedulingKey {
    pub fn new(semester: u32, academic_year: impl Into<String>) -> Self {
        Self {
            semester,
            academic_year: academic_year.into(),
        }
    }

    pub fn matches(&self, semester: u32, academic_year: &str) -> bool {
        self.semester == semester && self.academic_year == academic_year
    }
}

impl fmt::Display for SchedulingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "semester {} of {}", self.semester, self.academic_year)
    }
}

/// A placement produced during a generation run, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimetableEntry {
    pub course_id: CourseId,
    pub teacher_id: UserId,
    pub room_id: Option<RoomId>,
    pub time_slot_id: TimeSlotId,
    pub semester: u32,
    pub academic_year: String,
}

/// A persisted timetable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: EntryId,
    pub course_id: CourseId,
    /// Copied from the course when the entry is created.
    pub teacher_id: UserId,
    pub room_id: Option<RoomId>,
    pub time_slot_id: TimeSlotId,
    pub semester: u32,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Partial,
    Failed,
}

impl GenerationStatus {
    /// Every candidate placed is a success, none placed is a failure.
    pub fn from_counts(scheduled: usize, candidates: usize) -> Self {
        if scheduled == 0 {
            GenerationStatus::Failed
        } else if scheduled == candidates {
            GenerationStatus::Success
        } else {
            GenerationStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Success => "success",
            GenerationStatus::Partial => "partial",
            GenerationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one greedy pass, before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub status: GenerationStatus,
    pub candidates: usize,
    pub courses_scheduled: u32,
    pub conflicts_found: u32,
    pub conflicts_resolved: u32,
    pub entries: Vec<NewTimetableEntry>,
}

/// What a caller of `generate` gets back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub status: GenerationStatus,
    pub courses_scheduled: u32,
    pub conflicts_found: u32,
    pub conflicts_resolved: u32,
    pub entries: Vec<TimetableEntry>,
    /// Set only when the run aborted on a fault.
    pub error_message: Option<String>,
}

impl GenerationResult {
    pub fn failed(error_message: String) -> Self {
        Self {
            status: GenerationStatus::Failed,
            courses_scheduled: 0,
            conflicts_found: 0,
            conflicts_resolved: 0,
            entries: Vec::new(),
            error_message: Some(error_message),
        }
    }

    pub fn is_fault(&self) -> bool {
        self.error_message.is_some()
    }
}

/// Audit record payload before the store stamps it with an id and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGenerationLog {
    pub generated_by: Option<UserId>,
    pub status: GenerationStatus,
    pub courses_scheduled: u32,
    pub conflicts_found: u32,
    pub conflicts_resolved: u32,
    pub error_message: Option<String>,
}

/// One immutable row per generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGenerationLog {
    pub id: LogId,
    pub generated_by: Option<UserId>,
    pub status: GenerationStatus,
    pub courses_scheduled: u32,
    pub conflicts_found: u32,
    pub conflicts_resolved: u32,
    pub error_message: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Display form of a timetable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub id: EntryId,
    pub course: String,
    pub teacher_id: UserId,
    pub room: Option<String>,
    pub time_slot: String,
    pub semester: u32,
    pub academic_year: String,
}

/// Immutable catalog snapshot taken once at the start of a generation run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleCatalog {
    pub rooms: Vec<Room>,
    pub time_slots: Vec<TimeSlot>,
    pub courses: Vec<Course>,
}

impl ScheduleCatalog {
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn time_slot(&self, id: TimeSlotId) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.id == id)
    }

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Renders an entry for display. Unknown references render as their id.
    pub fn render(&self, entry: &TimetableEntry) -> EntryView {
        EntryView {
            id: entry.id,
            course: self
                .course(entry.course_id)
                .map(|c| c.code.clone())
                .unwrap_or_else(|| format!("course #{}", entry.course_id)),
            teacher_id: entry.teacher_id,
            room: entry.room_id.map(|id| {
                self.room(id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| format!("room #{id}"))
            }),
            time_slot: self
                .time_slot(entry.time_slot_id)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("time slot #{}", entry.time_slot_id)),
            semester: entry.semester,
            academic_year: entry.academic_year.clone(),
        }
    }
}
