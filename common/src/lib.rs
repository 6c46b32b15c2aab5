// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// User role, totally ordered: `Worker < Manager < Supervisor < Admin`.
///
/// The derived `Ord` follows declaration order, so role comparisons
/// (`user.role >= Role::Manager`) are the single source of truth for the
/// hierarchy. Stored as lowercase TEXT in the database.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Worker,
    Manager,
    Supervisor,
    Admin,
}

impl Role {
    /// Parses a role from its wire representation. Returns `None` for
    /// anything outside the four valid roles.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "worker" => Some(Role::Worker),
            "manager" => Some(Role::Manager),
            "supervisor" => Some(Role::Supervisor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Manager => "manager",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
        }
    }
}

/// Task status. Transitions are free in every direction; the only gate is
/// the completed-task lock enforced by the authorization layer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Assigned,
    Comment,
    Reminder,
}

/// A registered user. The password hash never leaves the server.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The safe-to-expose slice of a user, used in every API response.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// A stored refresh token. Only the SHA-256 digest of the raw token is
/// persisted; a row is usable iff `revoked_at` is unset and `expires_at`
/// lies in the future.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub hashed_token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A project. `members` is a set of user ids; the owner is an implicit
/// member and never appears in the set.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub members: Json<Vec<i64>>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn is_member(&self, user_id: i64) -> bool {
        self.members.contains(&user_id)
    }
}

/// A task. `assigned_to` holds at most two user ids.
/// `completed_at` is non-null exactly when `status == Completed`.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub equipment: Option<String>,
    pub area: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assigned_to: Json<Vec<i64>>,
    pub created_by: i64,
    pub project_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_assignee(&self, user_id: i64) -> bool {
        self.assigned_to.contains(&user_id)
    }
}

/// A comment on a task. `parent_id` forms a reply tree over comments of
/// the same task; deleting a comment removes its whole subtree.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub task_id: i64,
    pub author_id: i64,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A notification. Every row carries a hard expiry; `next_reminder_at` is
/// only meaningful for `Assigned` notifications and drives the reminder
/// chain.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A calendar event. Plain CRUD, no lifecycle.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

// --- API payloads ---
//
// Database models and API payloads are kept separate, as the fields (and
// their optionality) differ. Enum-valued fields arrive as plain strings so
// that out-of-enum values can be rejected as a 400 rather than a
// deserialization failure.

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshPayload {
    pub refresh_token: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub equipment: Option<String>,
    pub area: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Vec<i64>,
    pub project_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Distinguishes an absent key (outer `None`, leave unchanged) from an
/// explicit JSON `null` (inner `None`, clear the field).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Full task update. Absent fields are left unchanged; nullable fields
/// are cleared by sending an explicit `null`.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equipment: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub area: Option<Option<String>>,
    pub priority: Option<String>,
    pub assigned_to: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<String>,
}

/// Status-only update. Any extra field is captured instead of being
/// silently dropped, so the handler can reject it.
#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Debug)]
pub struct CreateProjectPayload {
    pub name: String,
    pub description: Option<String>,
    pub members: Option<Vec<i64>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub members: Option<Vec<i64>>,
}

#[derive(Deserialize, Debug)]
pub struct MemberPayload {
    pub user_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct CreateCommentPayload {
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCommentPayload {
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateRolePayload {
    pub role: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordPayload {
    pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateEventPayload {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_follows_hierarchy() {
        assert!(Role::Worker < Role::Manager);
        assert!(Role::Manager < Role::Supervisor);
        assert!(Role::Supervisor < Role::Admin);
        assert!(Role::Admin >= Role::Worker);
    }

    #[test]
    fn role_parse_rejects_unknown_values() {
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("superadmin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn status_parse_uses_kebab_case() {
        assert_eq!(
            TaskStatus::parse("in-progress"),
            Some(TaskStatus::InProgress)
        );
        assert_eq!(TaskStatus::parse("done"), None);
        assert_eq!(TaskStatus::InProgress.as_str(), "in-progress");
    }

    #[test]
    fn task_update_distinguishes_null_from_absent() {
        let payload: UpdateTaskPayload =
            serde_json::from_str(r#"{ "title": "New title" }"#).unwrap();
        assert_eq!(payload.description, None);
        assert_eq!(payload.due_date, None);

        let payload: UpdateTaskPayload =
            serde_json::from_str(r#"{ "description": null, "due_date": null }"#).unwrap();
        assert_eq!(payload.description, Some(None));
        assert_eq!(payload.due_date, Some(None));

        let payload: UpdateTaskPayload =
            serde_json::from_str(r#"{ "description": "Checked" }"#).unwrap();
        assert_eq!(payload.description, Some(Some("Checked".to_string())));
    }

    #[test]
    fn status_serde_round_trip() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: TaskStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }
}
