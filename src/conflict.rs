//! Teacher and room availability checks for one scheduling key.
//!
//! A generation run writes into a [`DraftTimetable`] and asks it whether a
//! teacher or room is taken. The draft indexes every entry committed so far in
//! the run, so later courses see the placements of earlier ones.

use std::collections::HashSet;

use crate::data::{Course, NewTimetableEntry, Room, RoomId, SchedulingKey, TimeSlotId, UserId};
use crate::error::ScheduleError;

/// Existence queries over the entries committed for a scheduling key.
pub trait ConflictChecker {
    fn is_teacher_busy(
        &self,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        semester: u32,
        academic_year: &str,
    ) -> bool;

    fn is_room_busy(
        &self,
        room_id: RoomId,
        time_slot_id: TimeSlotId,
        semester: u32,
        academic_year: &str,
    ) -> bool;
}

/// The working timetable of one run. Starts empty: the run replaces every
/// prior entry of its key.
#[derive(Debug, Clone)]
pub struct DraftTimetable {
    key: SchedulingKey,
    entries: Vec<NewTimetableEntry>,
    teacher_slots: HashSet<(UserId, TimeSlotId)>,
    room_slots: HashSet<(RoomId, TimeSlotId)>,
}

impl DraftTimetable {
    pub fn new(key: SchedulingKey) -> Self {
        Self {
            key,
            entries: Vec::new(),
            teacher_slots: HashSet::new(),
            room_slots: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a placement and returns the new entry. Refuses anything that
    /// would break the double-booking or capacity invariants.
    pub fn commit(
        &mut self,
        course: &Course,
        teacher_id: UserId,
        room: Option<&Room>,
        time_slot_id: TimeSlotId,
    ) -> Result<NewTimetableEntry, ScheduleError> {
        if self.teacher_slots.contains(&(teacher_id, time_slot_id)) {
            return Err(ScheduleError::TeacherDoubleBooked {
                teacher_id,
                time_slot_id,
            });
        }
        if let Some(room) = room {
            if self.room_slots.contains(&(room.id, time_slot_id)) {
                return Err(ScheduleError::RoomDoubleBooked {
                    room_id: room.id,
                    time_slot_id,
                });
            }
            if room.capacity < course.enrolled_count() {
                return Err(ScheduleError::CapacityExceeded {
                    room_id: room.id,
                    course_id: course.id,
                    capacity: room.capacity,
                    enrolled: course.enrolled_count(),
                });
            }
            self.room_slots.insert((room.id, time_slot_id));
        }
        self.teacher_slots.insert((teacher_id, time_slot_id));

        let entry = NewTimetableEntry {
            course_id: course.id,
            teacher_id,
            room_id: room.map(|r| r.id),
            time_slot_id,
            semester: self.key.semester,
            academic_year: self.key.academic_year.clone(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn into_entries(self) -> Vec<NewTimetableEntry> {
        self.entries
    }
}

impl ConflictChecker for DraftTimetable {
    fn is_teacher_busy(
        &self,
        teacher_id: UserId,
        time_slot_id: TimeSlotId,
        semester: u32,
        academic_year: &str,
    ) -> bool {
        self.key.matches(semester, academic_year)
            && self.teacher_slots.contains(&(teacher_id, time_slot_id))
    }

    fn is_room_busy(
        &self,
        room_id: RoomId,
        time_slot_id: TimeSlotId,
        semester: u32,
        academic_year: &str,
    ) -> bool {
        self.key.matches(semester, academic_year)
            && self.room_slots.contains(&(room_id, time_slot_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: u32, teacher: u32, students: u32) -> Course {
        Course {
            id,
            code: format!("C{id}"),
            name: String::new(),
            teacher_id: Some(teacher),
            student_ids: (0..students).collect(),
        }
    }

    fn room(id: u32, capacity: u32) -> Room {
        Room {
            id,
            name: format!("Room {id}"),
            capacity,
            building: String::new(),
            facilities: String::new(),
        }
    }

    fn key() -> SchedulingKey {
        SchedulingKey::new(1, "2024-2025")
    }

    #[test]
    fn committed_entries_are_visible_to_later_checks() {
        let mut draft = DraftTimetable::new(key());
        assert!(!draft.is_teacher_busy(7, 1, 1, "2024-2025"));
        assert!(!draft.is_room_busy(3, 1, 1, "2024-2025"));

        draft.commit(&course(1, 7, 10), 7, Some(&room(3, 20)), 1).unwrap();

        assert!(draft.is_teacher_busy(7, 1, 1, "2024-2025"));
        assert!(draft.is_room_busy(3, 1, 1, "2024-2025"));
        assert!(!draft.is_teacher_busy(7, 2, 1, "2024-2025"));
        assert!(!draft.is_room_busy(4, 1, 1, "2024-2025"));
    }

    #[test]
    fn other_keys_are_never_busy() {
        let mut draft = DraftTimetable::new(key());
        draft.commit(&course(1, 7, 10), 7, Some(&room(3, 20)), 1).unwrap();

        assert!(!draft.is_teacher_busy(7, 1, 2, "2024-2025"));
        assert!(!draft.is_room_busy(3, 1, 1, "2025-2026"));
    }

    #[test]
    fn commit_rejects_teacher_double_booking() {
        let mut draft = DraftTimetable::new(key());
        draft.commit(&course(1, 7, 10), 7, Some(&room(3, 20)), 1).unwrap();

        let err = draft
            .commit(&course(2, 7, 10), 7, Some(&room(4, 20)), 1)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::TeacherDoubleBooked { teacher_id: 7, time_slot_id: 1 }));
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn commit_rejects_room_double_booking() {
        let mut draft = DraftTimetable::new(key());
        draft.commit(&course(1, 7, 10), 7, Some(&room(3, 20)), 1).unwrap();

        let err = draft
            .commit(&course(2, 8, 10), 8, Some(&room(3, 20)), 1)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::RoomDoubleBooked { room_id: 3, time_slot_id: 1 }));
    }

    #[test]
    fn commit_rejects_undersized_room() {
        let mut draft = DraftTimetable::new(key());
        let err = draft
            .commit(&course(1, 7, 30), 7, Some(&room(3, 29)), 1)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::CapacityExceeded { capacity: 29, enrolled: 30, .. }));
        assert!(draft.is_empty());
    }

    #[test]
    fn roomless_entries_only_book_the_teacher() {
        let mut draft = DraftTimetable::new(key());
        let entry = draft.commit(&course(1, 7, 10), 7, None, 1).unwrap();
        assert_eq!(entry.room_id, None);
        assert_eq!(entry.semester, 1);
        assert_eq!(entry.academic_year, "2024-2025");
        assert!(draft.is_teacher_busy(7, 1, 1, "2024-2025"));
        assert_eq!(draft.into_entries(), vec![entry]);
    }
}
