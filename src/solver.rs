use crate::conflict::{ConflictChecker, DraftTimetable};
use crate::data::{
    Course, GenerationStatus, Room, ScheduleCatalog, ScheduleOutcome, SchedulingKey, TimeSlot,
};
use crate::error::ScheduleError;
use itertools::Itertools;
use log::{debug, info, trace};
use std::time::Instant;

/// Builds a timetable for `key` with a greedy first-fit sweep.
///
/// Courses are visited by ascending code, slots in canonical order and rooms
/// in catalog (name) order. A course takes the first slot where its teacher is
/// free and some free room seats every enrolled student. Nothing is ever
/// revisited, so the visiting order decides who wins a contested slot.
///
/// Counting:
/// - a course without a teacher adds one conflict;
/// - every slot where the teacher is already busy adds one conflict;
/// - a course that finds no placement adds one more conflict;
/// - every placement adds one resolved conflict.
///
/// Errors are run-level faults; an unschedulable course is not an error.
pub fn generate(
    key: &SchedulingKey,
    catalog: &ScheduleCatalog,
) -> Result<ScheduleOutcome, ScheduleError> {
    let start_time = Instant::now();

    let courses: Vec<&Course> = catalog
        .courses
        .iter()
        .filter(|c| c.has_enrollment())
        .sorted_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)))
        .collect();
    let time_slots: Vec<&TimeSlot> = catalog
        .time_slots
        .iter()
        .sorted_by_key(|s| s.canonical_key())
        .collect();
    let rooms: Vec<&Room> = catalog
        .rooms
        .iter()
        .sorted_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
        .collect();

    info!(
        "Generating timetable for {} with {} courses, {} rooms, and {} time slots...",
        key,
        courses.len(),
        rooms.len(),
        time_slots.len()
    );

    let mut draft = DraftTimetable::new(key.clone());
    let mut conflicts_found = 0u32;
    let mut conflicts_resolved = 0u32;

    for course in &courses {
        let Some(teacher_id) = course.teacher_id else {
            debug!("Course {} has no teacher, skipping.", course.code);
            conflicts_found += 1;
            continue;
        };

        let mut placed = false;
        for slot in &time_slots {
            if draft.is_teacher_busy(teacher_id, slot.id, key.semester, &key.academic_year) {
                trace!("Course {}: teacher {} busy at {}.", course.code, teacher_id, slot);
                conflicts_found += 1;
                continue;
            }

            let room = rooms.iter().copied().find(|room| {
                !draft.is_room_busy(room.id, slot.id, key.semester, &key.academic_year)
                    && room.capacity >= course.enrolled_count()
            });

            let Some(room) = room else {
                trace!("Course {}: no free room seating {} at {}.", course.code, course.enrolled_count(), slot);
                continue;
            };

            draft.commit(course, teacher_id, Some(room), slot.id)?;
            debug!("Course {} placed in {} at {}.", course.code, room.name, slot);
            conflicts_resolved += 1;
            placed = true;
            break;
        }

        if !placed {
            debug!("Course {} could not be placed.", course.code);
            conflicts_found += 1;
        }
    }

    let courses_scheduled = draft.len();
    let status = GenerationStatus::from_counts(courses_scheduled, courses.len());

    info!(
        "Timetable for {} finished in {:.2?}: {} ({} of {} courses scheduled, {} conflicts found, {} resolved).",
        key,
        start_time.elapsed(),
        status,
        courses_scheduled,
        courses.len(),
        conflicts_found,
        conflicts_resolved
    );

    Ok(ScheduleOutcome {
        status,
        candidates: courses.len(),
        courses_scheduled: courses_scheduled as u32,
        conflicts_found,
        conflicts_resolved,
        entries: draft.into_entries(),
    })
}
