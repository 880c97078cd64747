//! Per-user schedule store.
//!
//! Each user has a subject map and a day grid that index the same commitments.
//! All writes go through [`Schedule::try_add`] and [`Schedule::remove`], which
//! keep both views in step and never leave a partial write behind.

use super::pending::PendingSelection;
use super::time_block::{parse_time_block, TimeBlock, Weekday};
use crate::models::TeacherOffer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A committed subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub teacher: String,
    /// Raw time blocks, as offered
    pub time_blocks: Vec<String>,
    pub classroom: String,
}

/// One class meeting in the day grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridEntry {
    pub subject: String,
    pub teacher: String,
    /// Raw time block string, e.g. `"LU 645-815"`
    pub time: String,
    pub classroom: String,
    pub block: TimeBlock,
}

impl GridEntry {
    /// `"{subject} - {teacher} ({time})"`
    pub fn describe(&self) -> String {
        format!("{} - {} ({})", self.subject, self.teacher, self.time)
    }
}

/// Why a subject could not be added
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleRejection {
    #[error("schedule conflicts: {}", .0.join("; "))]
    Conflicts(Vec<String>),
    #[error("{0} is already in the schedule")]
    AlreadyEnrolled(String),
}

/// A user's schedule. Also the snapshot type returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub subjects: BTreeMap<String, Enrollment>,
    pub grid: BTreeMap<Weekday, Vec<GridEntry>>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Descriptions of every existing block overlapping `block`
    pub fn conflicts_with(&self, block: &TimeBlock) -> Vec<String> {
        self.grid
            .get(&block.day)
            .into_iter()
            .flatten()
            .filter(|entry| entry.block.overlaps(block))
            .map(GridEntry::describe)
            .collect()
    }

    /// Conflicts a candidate would introduce, against the grid and among its own blocks.
    pub fn candidate_conflicts(&self, subject: &str, teacher: &str, blocks: &[String]) -> Vec<String> {
        let mut conflicts = Vec::new();
        let mut accepted: Vec<(&str, TimeBlock)> = Vec::new();

        for raw in blocks {
            let Some(block) = parse_time_block(raw) else {
                continue;
            };
            conflicts.extend(self.conflicts_with(&block));
            conflicts.extend(
                accepted
                    .iter()
                    .filter(|(_, earlier)| earlier.overlaps(&block))
                    .map(|(earlier_raw, _)| format!("{} - {} ({})", subject, teacher, earlier_raw)),
            );
            accepted.push((raw.as_str(), block));
        }
        conflicts
    }

    /// Add a subject atomically: either every block lands in the grid or nothing changes.
    pub fn try_add(
        &mut self,
        subject: &str,
        teacher: &str,
        blocks: &[String],
        classroom: &str,
    ) -> Result<(), ScheduleRejection> {
        if self.subjects.contains_key(subject) {
            return Err(ScheduleRejection::AlreadyEnrolled(subject.to_string()));
        }

        let conflicts = self.candidate_conflicts(subject, teacher, blocks);
        if !conflicts.is_empty() {
            return Err(ScheduleRejection::Conflicts(conflicts));
        }

        let mut kept = Vec::with_capacity(blocks.len());
        for raw in blocks {
            match parse_time_block(raw) {
                Some(block) => kept.push((raw.clone(), block)),
                None => warn!("Dropping malformed time block {:?} for {}", raw, subject),
            }
        }

        for (raw, block) in &kept {
            self.grid.entry(block.day).or_default().push(GridEntry {
                subject: subject.to_string(),
                teacher: teacher.to_string(),
                time: raw.clone(),
                classroom: classroom.to_string(),
                block: *block,
            });
        }
        self.subjects.insert(
            subject.to_string(),
            Enrollment {
                teacher: teacher.to_string(),
                time_blocks: kept.into_iter().map(|(raw, _)| raw).collect(),
                classroom: classroom.to_string(),
            },
        );
        Ok(())
    }

    /// Remove a subject and all of its grid entries; emptied days disappear.
    pub fn remove(&mut self, subject: &str) -> bool {
        if self.subjects.remove(subject).is_none() {
            return false;
        }
        self.grid.retain(|_, entries| {
            entries.retain(|entry| entry.subject != subject);
            !entries.is_empty()
        });
        true
    }

    /// Text rendering, days in week order and classes by start time
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "Tu horario está vacío. ¡Empieza agregando materias!".to_string();
        }

        let mut result = String::from("🗓️ **TU HORARIO ACTUAL:**\n\n");
        for (day, entries) in &self.grid {
            result.push_str(&format!("**{}:**\n", day.name()));

            let mut classes: Vec<&GridEntry> = entries.iter().collect();
            classes.sort_by_key(|entry| entry.block.start);

            for class in classes {
                let time = class
                    .time
                    .strip_prefix(day.code())
                    .map(str::trim_start)
                    .unwrap_or(&class.time);
                result.push_str(&format!("  • {} - {}\n", class.subject, time));
                result.push_str(&format!("    👨‍🏫 {}\n", class.teacher));
                result.push_str(&format!("    📍 Aula {}\n\n", class.classroom));
            }
        }
        result.push_str(&format!("📚 **Total de materias:** {}\n", self.subject_count()));
        result
    }
}

/// An option annotated with the conflicts each of its blocks would cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedOption {
    /// Position in the list that was ranked
    pub index: usize,
    pub option: TeacherOffer,
    /// `(block index, conflict description)`
    pub conflicts: Vec<(usize, String)>,
}

impl RankedOption {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Recover the guard from a poisoned lock; the maps stay usable.
pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store of schedules and pending selections, keyed by user id.
///
/// Lock order is `pending` then `schedules` whenever both are held.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    pub(super) schedules: Mutex<HashMap<String, Schedule>>,
    pub(super) pending: Mutex<HashMap<String, PendingSelection>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing blocks a new block would overlap. Empty for unknown users and malformed blocks.
    pub fn check_conflict(&self, user_id: &str, raw_block: &str) -> Vec<String> {
        let Some(block) = parse_time_block(raw_block) else {
            return Vec::new();
        };
        lock(&self.schedules)
            .get(user_id)
            .map(|schedule| schedule.conflicts_with(&block))
            .unwrap_or_default()
    }

    pub fn add_subject(
        &self,
        user_id: &str,
        subject: &str,
        teacher: &str,
        blocks: &[String],
        classroom: &str,
    ) -> Result<(), ScheduleRejection> {
        let mut schedules = lock(&self.schedules);
        add_to(&mut schedules, user_id, subject, teacher, blocks, classroom)
    }

    pub fn remove_subject(&self, user_id: &str, subject: &str) -> bool {
        let removed = lock(&self.schedules)
            .get_mut(user_id)
            .is_some_and(|schedule| schedule.remove(subject));
        if removed {
            info!(user_id, subject, "Subject removed");
        }
        removed
    }

    /// Snapshot; an empty schedule for unknown users
    pub fn get_schedule(&self, user_id: &str) -> Schedule {
        lock(&self.schedules)
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop the user's schedule entirely. Pending selections are left alone.
    pub fn clear_schedule(&self, user_id: &str) -> bool {
        if lock(&self.schedules).remove(user_id).is_some() {
            info!(user_id, "Schedule cleared");
        }
        true
    }

    pub fn format_display(&self, user_id: &str) -> String {
        self.get_schedule(user_id).render()
    }

    /// Annotate each option with its per-block conflicts, fewest conflicts first (stable).
    pub fn rank_alternatives(&self, user_id: &str, options: &[TeacherOffer]) -> Vec<RankedOption> {
        let schedules = lock(&self.schedules);
        let schedule = schedules.get(user_id);

        let mut ranked: Vec<RankedOption> = options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                let conflicts = option
                    .time_blocks
                    .iter()
                    .enumerate()
                    .filter_map(|(i, raw)| Some((i, parse_time_block(raw)?)))
                    .flat_map(|(i, block)| {
                        schedule
                            .map(|s| s.conflicts_with(&block))
                            .unwrap_or_default()
                            .into_iter()
                            .map(move |c| (i, c))
                    })
                    .collect();
                RankedOption {
                    index,
                    option: option.clone(),
                    conflicts,
                }
            })
            .collect();

        ranked.sort_by_key(|r| r.conflicts.len());
        ranked
    }
}

/// Shared by direct adds and selection commits; the caller holds the schedules lock.
pub(super) fn add_to(
    schedules: &mut HashMap<String, Schedule>,
    user_id: &str,
    subject: &str,
    teacher: &str,
    blocks: &[String],
    classroom: &str,
) -> Result<(), ScheduleRejection> {
    let result = match schedules.get_mut(user_id) {
        Some(schedule) => schedule.try_add(subject, teacher, blocks, classroom),
        None => {
            let mut schedule = Schedule::default();
            let result = schedule.try_add(subject, teacher, blocks, classroom);
            if result.is_ok() {
                schedules.insert(user_id.to_string(), schedule);
            }
            result
        }
    };

    match &result {
        Ok(()) => info!(user_id, subject, teacher, "Subject added"),
        Err(rejection) => debug!(user_id, subject, "Subject rejected: {}", rejection),
    }
    result
}
