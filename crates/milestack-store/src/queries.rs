use chrono::Utc;

use milestack_types::api::{MilestonePatch, TaskPatch};
use milestack_types::models::{ChatMessage, ChatThread, Milestone, Project, Task, User};

use crate::Store;

impl Store {
    // -- Users --

    pub fn insert_user(&self, user: User) -> User {
        self.with_data_mut(|db| {
            db.users.push(user.clone());
            user
        })
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.with_data(|db| db.users.iter().find(|u| u.email == email).cloned())
    }

    pub fn user_by_id(&self, id: &str) -> Option<User> {
        self.with_data(|db| db.users.iter().find(|u| u.id == id).cloned())
    }

    pub fn set_user_status(&self, id: &str, status: &str) -> Option<User> {
        self.with_data_mut(|db| {
            let user = db.users.iter_mut().find(|u| u.id == id)?;
            user.status = status.to_string();
            Some(user.clone())
        })
    }

    // -- Projects --

    pub fn insert_project(&self, project: Project) -> Project {
        self.with_data_mut(|db| {
            db.projects.push(project.clone());
            project
        })
    }

    pub fn project_by_id(&self, id: &str) -> Option<Project> {
        self.with_data(|db| db.projects.iter().find(|p| p.id == id).cloned())
    }

    /// Projects visible to a user: those with a membership row for them,
    /// in insertion order.
    pub fn projects_for_user(&self, user_id: &str) -> Vec<Project> {
        self.with_data(|db| {
            db.projects
                .iter()
                .filter(|p| {
                    db.project_members
                        .iter()
                        .any(|m| m.project_id == p.id && m.user_id == user_id)
                })
                .cloned()
                .collect()
        })
    }

    // -- Tasks --

    pub fn insert_task(&self, task: Task) -> Task {
        self.with_data_mut(|db| {
            db.tasks.push(task.clone());
            task
        })
    }

    pub fn task_by_id(&self, id: &str) -> Option<Task> {
        self.with_data(|db| db.tasks.iter().find(|t| t.id == id).cloned())
    }

    pub fn tasks_by_project(&self, project_id: &str) -> Vec<Task> {
        self.with_data(|db| {
            db.tasks
                .iter()
                .filter(|t| t.project_id == project_id)
                .cloned()
                .collect()
        })
    }

    /// Merge the whitelisted patch into the task and bump `updated_at`.
    /// Returns the updated task, or `None` if the id is unknown.
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Option<Task> {
        self.with_data_mut(|db| {
            let task = db.tasks.iter_mut().find(|t| t.id == id)?;
            if let Some(title) = &patch.title {
                task.title = title.clone();
            }
            if let Some(description) = &patch.description {
                task.description = description.clone();
            }
            if let Some(priority) = &patch.priority {
                task.priority = priority.clone();
            }
            if let Some(status) = &patch.status {
                task.status = status.clone();
            }
            if let Some(assignee) = &patch.assignee_id {
                task.assignee_id = assignee.clone();
            }
            task.updated_at = Utc::now();
            Some(task.clone())
        })
    }

    pub fn delete_task(&self, id: &str) -> Option<Task> {
        self.with_data_mut(|db| {
            let idx = db.tasks.iter().position(|t| t.id == id)?;
            Some(db.tasks.remove(idx))
        })
    }

    // -- Milestones --

    pub fn insert_milestone(&self, milestone: Milestone) -> Milestone {
        self.with_data_mut(|db| {
            db.milestones.push(milestone.clone());
            milestone
        })
    }

    pub fn milestone_by_id(&self, id: &str) -> Option<Milestone> {
        self.with_data(|db| db.milestones.iter().find(|m| m.id == id).cloned())
    }

    pub fn milestones_by_project(&self, project_id: &str) -> Vec<Milestone> {
        self.with_data(|db| {
            db.milestones
                .iter()
                .filter(|m| m.project_id == project_id)
                .cloned()
                .collect()
        })
    }

    pub fn update_milestone(&self, id: &str, patch: &MilestonePatch) -> Option<Milestone> {
        self.with_data_mut(|db| {
            let milestone = db.milestones.iter_mut().find(|m| m.id == id)?;
            if let Some(title) = &patch.title {
                milestone.title = title.clone();
            }
            if let Some(description) = &patch.description {
                milestone.description = description.clone();
            }
            if let Some(due_date) = &patch.due_date {
                milestone.due_date = due_date.clone();
            }
            if let Some(status) = &patch.status {
                milestone.status = status.clone();
            }
            if let Some(progress) = patch.progress {
                milestone.progress = progress;
            }
            milestone.updated_at = Utc::now();
            Some(milestone.clone())
        })
    }

    pub fn delete_milestone(&self, id: &str) -> Option<Milestone> {
        self.with_data_mut(|db| {
            let idx = db.milestones.iter().position(|m| m.id == id)?;
            Some(db.milestones.remove(idx))
        })
    }

    // -- Chat threads --

    pub fn insert_thread(&self, thread: ChatThread) -> ChatThread {
        self.with_data_mut(|db| {
            db.chat_threads.push(thread.clone());
            thread
        })
    }

    pub fn thread_by_id(&self, id: &str) -> Option<ChatThread> {
        self.with_data(|db| db.chat_threads.iter().find(|t| t.id == id).cloned())
    }

    pub fn threads_by_project(&self, project_id: &str) -> Vec<ChatThread> {
        self.with_data(|db| {
            db.chat_threads
                .iter()
                .filter(|t| t.project_id == project_id)
                .cloned()
                .collect()
        })
    }

    /// Plain whitelist patch: title and wholesale message replacement.
    /// Bumps `updated_at` only when the patch changed something.
    pub fn patch_thread(
        &self,
        id: &str,
        title: Option<&str>,
        messages: Option<Vec<ChatMessage>>,
    ) -> Option<ChatThread> {
        self.with_data_mut(|db| {
            let thread = db.chat_threads.iter_mut().find(|t| t.id == id)?;
            let touched = title.is_some() || messages.is_some();
            if let Some(title) = title {
                thread.title = title.to_string();
            }
            if let Some(messages) = messages {
                thread.messages = messages;
            }
            if touched {
                thread.updated_at = Utc::now();
            }
            Some(thread.clone())
        })
    }

    pub fn append_message(&self, id: &str, message: ChatMessage) -> Option<ChatThread> {
        self.with_data_mut(|db| {
            let thread = db.chat_threads.iter_mut().find(|t| t.id == id)?;
            thread.messages.push(message);
            thread.updated_at = Utc::now();
            Some(thread.clone())
        })
    }

    pub fn delete_thread(&self, id: &str) -> Option<ChatThread> {
        self.with_data_mut(|db| {
            let idx = db.chat_threads.iter().position(|t| t.id == id)?;
            Some(db.chat_threads.remove(idx))
        })
    }
}
