// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! The authorization engine. Every decision is a pure function of
//! (role, ownership, assignment) so the whole policy is unit-testable
//! without a database. Each denial carries a stable reason string which
//! the handler layer surfaces as a 403.

use common::{Comment, Project, Role, Task, TaskStatus, User};

/// Reason for the completed-task lock, distinct from generic permission
/// denials so clients can tell the two apart.
pub const REASON_COMPLETED_LOCKED: &str = "Only the task creator can modify a completed task";

/// A refused authorization decision.
#[derive(Debug, PartialEq, Eq)]
pub struct Deny(pub String);

impl Deny {
    fn new(reason: impl Into<String>) -> Self {
        Deny(reason.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Task,
}

pub fn has_min_role(user: &User, min: Role) -> bool {
    user.role >= min
}

pub fn require_min_role(user: &User, min: Role) -> Result<(), Deny> {
    if has_min_role(user, min) {
        Ok(())
    } else {
        Err(Deny::new(format!(
            "This action requires the {} role or higher",
            min.as_str()
        )))
    }
}

/// Coarse ownership gate. Managers deliberately get no blanket access to
/// projects they do not own; the manager arm below is redundant with the
/// ownership arm and kept to make that intent explicit.
pub fn can_access_resource(user: &User, owner_id: i64, kind: ResourceKind) -> bool {
    if user.role >= Role::Supervisor {
        return true;
    }
    if user.id == owner_id {
        return true;
    }
    if kind == ResourceKind::Project && user.role == Role::Manager && user.id == owner_id {
        return true;
    }
    false
}

/// Admin/supervisor, or the owner of the task's project (when the task is
/// project-scoped).
fn is_project_owner_equivalent(user: &User, project: Option<&Project>) -> bool {
    if user.role >= Role::Supervisor {
        return true;
    }
    project.is_some_and(|p| p.owner_id == user.id)
}

/// The completed-task lock: once a task is completed, only its creator
/// may mutate it further, including reopening it.
fn completed_lock(user: &User, task: &Task) -> Result<(), Deny> {
    if task.status == TaskStatus::Completed && task.created_by != user.id {
        Err(Deny::new(REASON_COMPLETED_LOCKED))
    } else {
        Ok(())
    }
}

/// Viewing matches the role-narrowed listing: members of the task's
/// project can open what the list shows them.
pub fn can_view_task(user: &User, task: &Task, project: Option<&Project>) -> Result<(), Deny> {
    if is_project_owner_equivalent(user, project)
        || task.is_assignee(user.id)
        || task.created_by == user.id
        || project.is_some_and(|p| p.is_member(user.id))
    {
        Ok(())
    } else {
        Err(Deny::new("You do not have permission to view this task"))
    }
}

/// Full-edit rights: title, description, priority, assignees, due date.
/// Assignees do not qualify; they only get the status path.
pub fn has_full_edit_rights(user: &User, task: &Task, project: Option<&Project>) -> bool {
    is_project_owner_equivalent(user, project) || task.created_by == user.id
}

pub fn can_edit_task(user: &User, task: &Task, project: Option<&Project>) -> Result<(), Deny> {
    if !has_full_edit_rights(user, task, project) {
        return Err(Deny::new("You do not have permission to edit this task"));
    }
    completed_lock(user, task)
}

pub fn can_update_status(user: &User, task: &Task, project: Option<&Project>) -> Result<(), Deny> {
    if !task.is_assignee(user.id) && !has_full_edit_rights(user, task, project) {
        return Err(Deny::new("You do not have permission to update this task"));
    }
    completed_lock(user, task)
}

/// Deletion is narrower than editing: admin, project owner (for
/// project-scoped tasks) or creator. Assignees and supervisors may not
/// delete.
pub fn can_delete_task(user: &User, task: &Task, project: Option<&Project>) -> Result<(), Deny> {
    if user.role == Role::Admin
        || task.created_by == user.id
        || project.is_some_and(|p| p.owner_id == user.id)
    {
        Ok(())
    } else {
        Err(Deny::new(
            "Only the task creator, the project owner or an admin can delete this task",
        ))
    }
}

pub fn can_edit_comment(user: &User, comment: &Comment) -> Result<(), Deny> {
    if comment.author_id == user.id {
        Ok(())
    } else {
        Err(Deny::new("You can only edit your own comments"))
    }
}

/// Author or task creator only. There is intentionally no admin override
/// here, unlike task deletion.
pub fn can_delete_comment(user: &User, comment: &Comment, task: &Task) -> Result<(), Deny> {
    if comment.author_id == user.id || task.created_by == user.id {
        Ok(())
    } else {
        Err(Deny::new(
            "You can only delete your own comments or comments on tasks you created",
        ))
    }
}

pub fn can_view_project(user: &User, project: &Project) -> Result<(), Deny> {
    if can_access_resource(user, project.owner_id, ResourceKind::Project)
        || project.is_member(user.id)
    {
        Ok(())
    } else {
        Err(Deny::new("Access denied to this project"))
    }
}

pub fn can_update_project(user: &User, project: &Project) -> Result<(), Deny> {
    if can_access_resource(user, project.owner_id, ResourceKind::Project) {
        Ok(())
    } else {
        Err(Deny::new(
            "Only the project owner or admin/supervisor can update this project",
        ))
    }
}

pub fn can_manage_members(user: &User, project: &Project) -> Result<(), Deny> {
    if can_access_resource(user, project.owner_id, ResourceKind::Project) {
        Ok(())
    } else {
        Err(Deny::new(
            "Only the project owner or admin/supervisor can manage members",
        ))
    }
}

/// Owner or admin only; supervisors are excluded here, asymmetric with
/// the other project operations.
pub fn can_delete_project(user: &User, project: &Project) -> Result<(), Deny> {
    if project.owner_id == user.id || user.role == Role::Admin {
        Ok(())
    } else {
        Err(Deny::new(
            "Only the project owner or admin can delete this project",
        ))
    }
}
