//! Timetable generation and exam auto-grading for a school-management backend.
//!
//! The scheduler assigns every enrolled course a room and weekly time slot for
//! a `(semester, academic_year)` key with a greedy first-fit sweep, and logs
//! each attempt. The grading engine scores multiple-choice answers against
//! their answer key. Both sit behind repository traits in [`store`] and are
//! served over HTTP by [`server`].

pub mod audit;
pub mod catalog;
pub mod config;
pub mod conflict;
pub mod data;
pub mod error;
pub mod exam;
pub mod grading;
pub mod locks;
pub mod server;
pub mod service;
pub mod solver;
pub mod store;
