//! Catalog data the service starts from: rooms, time slots, courses and exams.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::data::{Course, Room, TimeSlot, Weekday};
use crate::error::CatalogError;
use crate::exam::{AnswerOption, Exam, Question, QuestionType};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl CatalogSnapshot {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        info!(
            "Loaded catalog from {} ({} rooms, {} time slots, {} courses, {} exams).",
            path.display(),
            catalog.rooms.len(),
            catalog.time_slots.len(),
            catalog.courses.len(),
            catalog.exams.len()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks the uniqueness and sanity rules of every catalog table.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut room_ids = HashSet::new();
        let mut room_names = HashSet::new();
        for room in &self.rooms {
            if !room_ids.insert(room.id) {
                return Err(invalid(format!("duplicate room id {}", room.id)));
            }
            if !room_names.insert(room.name.as_str()) {
                return Err(invalid(format!("duplicate room name {:?}", room.name)));
            }
            if room.capacity == 0 {
                return Err(invalid(format!("room {:?} has zero capacity", room.name)));
            }
        }

        let mut slot_ids = HashSet::new();
        let mut slot_periods = HashSet::new();
        for slot in &self.time_slots {
            if !slot_ids.insert(slot.id) {
                return Err(invalid(format!("duplicate time slot id {}", slot.id)));
            }
            if !slot_periods.insert((slot.day, slot.start_time, slot.end_time)) {
                return Err(invalid(format!("duplicate time slot {slot}")));
            }
            if slot.start_time >= slot.end_time {
                return Err(invalid(format!("time slot {slot} ends before it starts")));
            }
        }

        let mut course_ids = HashSet::new();
        let mut course_codes = HashSet::new();
        for course in &self.courses {
            if !course_ids.insert(course.id) {
                return Err(invalid(format!("duplicate course id {}", course.id)));
            }
            if !course_codes.insert(course.code.as_str()) {
                return Err(invalid(format!("duplicate course code {:?}", course.code)));
            }
        }

        let mut exam_ids = HashSet::new();
        for exam in &self.exams {
            if !exam_ids.insert(exam.id) {
                return Err(invalid(format!("duplicate exam id {}", exam.id)));
            }
            if exam.start_time >= exam.end_time {
                return Err(invalid(format!("exam {} ends before it starts", exam.id)));
            }
        }
        let mut question_ids = HashSet::new();
        let mut option_ids = HashSet::new();
        for question in &self.questions {
            if !question_ids.insert(question.id) {
                return Err(invalid(format!("duplicate question id {}", question.id)));
            }
            if !exam_ids.contains(&question.exam_id) {
                return Err(invalid(format!(
                    "question {} belongs to unknown exam {}",
                    question.id, question.exam_id
                )));
            }
            for option in &question.options {
                if !option_ids.insert(option.id) {
                    return Err(invalid(format!("duplicate option id {}", option.id)));
                }
            }
        }

        Ok(())
    }

    /// Demo data: five rooms, four periods a day Monday to Friday, four
    /// courses of twenty students, and two open single-answer exams.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let rooms = (1..=5)
            .map(|i| Room {
                id: i,
                name: format!("Room {i}01"),
                capacity: 50 + i * 10,
                building: "Building A".to_string(),
                facilities: "projector, whiteboard".to_string(),
            })
            .collect();

        let periods = [((9, 0), (10, 30)), ((10, 45), (12, 15)), ((13, 0), (14, 30)), ((14, 45), (16, 15))];
        let mut time_slots = Vec::new();
        for day in &Weekday::ALL[..5] {
            for ((sh, sm), (eh, em)) in periods {
                if let (Some(start_time), Some(end_time)) =
                    (NaiveTime::from_hms_opt(sh, sm, 0), NaiveTime::from_hms_opt(eh, em, 0))
                {
                    time_slots.push(TimeSlot {
                        id: time_slots.len() as u32 + 1,
                        day: *day,
                        start_time,
                        end_time,
                    });
                }
            }
        }

        // Teachers are users 2..=5, students 100..=119.
        let course_data = [
            ("CS101", "Introduction to Programming"),
            ("CS201", "Data Structures"),
            ("EE101", "Circuit Analysis"),
            ("EE201", "Digital Electronics"),
        ];
        let courses: Vec<Course> = course_data
            .iter()
            .enumerate()
            .map(|(i, (code, name))| Course {
                id: i as u32 + 1,
                code: code.to_string(),
                name: name.to_string(),
                teacher_id: Some(i as u32 + 2),
                student_ids: (100..120).collect(),
            })
            .collect();

        let mut exams = Vec::new();
        let mut questions = Vec::new();
        for course in courses.iter().take(2) {
            let exam_id = course.id;
            exams.push(Exam {
                id: exam_id,
                title: format!("{} Midterm Exam", course.code),
                course_id: course.id,
                teacher_id: course.teacher_id.unwrap_or_default(),
                start_time: now,
                end_time: now + Duration::days(14),
                duration_minutes: 120,
                max_marks: 100,
                passing_marks: 40,
                is_published: true,
                allow_retake: false,
            });
            for q in 1..=5u32 {
                let question_id = exam_id * 100 + q;
                questions.push(Question {
                    id: question_id,
                    exam_id,
                    text: format!("Question {q}: What is the answer?"),
                    question_type: QuestionType::Mcq,
                    marks: 20,
                    order: q,
                    options: (1..=4u32)
                        .map(|o| AnswerOption {
                            id: question_id * 10 + o,
                            text: format!("Option {o}"),
                            is_correct: o == 1,
                            order: o,
                        })
                        .collect(),
                });
            }
        }

        Self {
            rooms,
            time_slots,
            courses,
            exams,
            questions,
        }
    }
}

fn invalid(message: String) -> CatalogError {
    CatalogError::Invalid(message)
}
