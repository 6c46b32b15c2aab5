// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Task status state machine. Transitions are free in every direction
//! (the completed-task lock lives in `authz`); this module owns the
//! single side-effect rule: `completed_at` is set exactly while the task
//! is completed.

use chrono::{DateTime, Utc};
use common::TaskStatus;

/// Computes the `completed_at` value that must be stored alongside a
/// status change. A no-op transition leaves the timestamp untouched.
pub fn completed_at_after_transition(
    current: TaskStatus,
    current_completed_at: Option<DateTime<Utc>>,
    requested: TaskStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current, requested) {
        (TaskStatus::Completed, TaskStatus::Completed) => current_completed_at,
        (_, TaskStatus::Completed) => Some(now),
        (TaskStatus::Completed, _) => None,
        _ => current_completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entering_completed_sets_timestamp() {
        let now = Utc::now();
        let result =
            completed_at_after_transition(TaskStatus::Pending, None, TaskStatus::Completed, now);
        assert_eq!(result, Some(now));
        let result =
            completed_at_after_transition(TaskStatus::InProgress, None, TaskStatus::Completed, now);
        assert_eq!(result, Some(now));
    }

    #[test]
    fn leaving_completed_clears_timestamp() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::hours(1);
        let result = completed_at_after_transition(
            TaskStatus::Completed,
            Some(earlier),
            TaskStatus::Pending,
            now,
        );
        assert_eq!(result, None);
        let result = completed_at_after_transition(
            TaskStatus::Completed,
            Some(earlier),
            TaskStatus::InProgress,
            now,
        );
        assert_eq!(result, None);
    }

    #[test]
    fn noop_transitions_are_inert() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::hours(1);
        // Completed -> completed keeps the original timestamp.
        let result = completed_at_after_transition(
            TaskStatus::Completed,
            Some(earlier),
            TaskStatus::Completed,
            now,
        );
        assert_eq!(result, Some(earlier));
        // Between two non-completed statuses the timestamp stays null.
        let result = completed_at_after_transition(
            TaskStatus::Pending,
            None,
            TaskStatus::InProgress,
            now,
        );
        assert_eq!(result, None);
    }
}
