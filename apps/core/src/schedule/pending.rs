//! Pending selections: the options last offered to a user, awaiting an ordinal reply.

use super::store::{add_to, lock, ScheduleRejection, ScheduleStore};
use crate::models::TeacherOffer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options presented to a user for one subject. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub subject_name: String,
    pub options: Vec<TeacherOffer>,
}

/// Result of trying to commit option `choice` (1-based) of a pending selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing was pending for the user
    NothingPending,
    /// The number is outside `[1, available]`; the selection stays pending
    OutOfRange { choice: usize, available: usize },
    /// The chosen option collides with the schedule; the selection stays pending
    Conflicts {
        choice: usize,
        conflicts: Vec<String>,
    },
    /// The subject is already in the schedule; the selection is dropped
    AlreadyEnrolled { subject_name: String },
    /// Added to the schedule; the selection is consumed
    Committed {
        subject_name: String,
        option: TeacherOffer,
        subject_count: usize,
    },
}

impl ScheduleStore {
    /// Record the options offered to a user, replacing any previous offer
    pub fn set_pending(&self, user_id: &str, selection: PendingSelection) {
        debug!(
            user_id,
            subject = %selection.subject_name,
            options = selection.options.len(),
            "Pending selection recorded"
        );
        lock(&self.pending).insert(user_id.to_string(), selection);
    }

    pub fn pending(&self, user_id: &str) -> Option<PendingSelection> {
        lock(&self.pending).get(user_id).cloned()
    }

    pub fn has_pending(&self, user_id: &str) -> bool {
        lock(&self.pending).contains_key(user_id)
    }

    pub fn take_pending(&self, user_id: &str) -> Option<PendingSelection> {
        lock(&self.pending).remove(user_id)
    }

    /// Bounds check, conflict re-check and commit, all under both locks.
    pub fn commit_pending(&self, user_id: &str, choice: usize) -> CommitOutcome {
        let mut pending = lock(&self.pending);
        let Some(selection) = pending.get(user_id) else {
            return CommitOutcome::NothingPending;
        };

        let available = selection.options.len();
        if choice == 0 || choice > available {
            return CommitOutcome::OutOfRange { choice, available };
        }

        let option = selection.options[choice - 1].clone();
        let subject_name = selection.subject_name.clone();

        let mut schedules = lock(&self.schedules);
        match add_to(
            &mut schedules,
            user_id,
            &subject_name,
            &option.name,
            &option.time_blocks,
            &option.classroom_label(),
        ) {
            Ok(()) => {
                pending.remove(user_id);
                let subject_count = schedules
                    .get(user_id)
                    .map(|s| s.subject_count())
                    .unwrap_or_default();
                CommitOutcome::Committed {
                    subject_name,
                    option,
                    subject_count,
                }
            }
            Err(ScheduleRejection::Conflicts(conflicts)) => {
                CommitOutcome::Conflicts { choice, conflicts }
            }
            Err(ScheduleRejection::AlreadyEnrolled(_)) => {
                pending.remove(user_id);
                CommitOutcome::AlreadyEnrolled { subject_name }
            }
        }
    }
}
