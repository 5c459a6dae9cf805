pub mod activity;
pub mod members;
pub mod queries;

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;
use uuid::Uuid;

use milestack_types::models::{
    Activity, ChatThread, Invite, Milestone, Project, ProjectMember, Task, User,
};

/// Every collection the backend knows about. One `Vec` per entity kind;
/// iteration order is insertion order.
#[derive(Debug, Default)]
pub struct Db {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub milestones: Vec<Milestone>,
    pub chat_threads: Vec<ChatThread>,
    pub project_members: Vec<ProjectMember>,
    pub invites: Vec<Invite>,
    pub activities: Vec<Activity>,
}

/// Shared in-memory store. State lives for the process lifetime only; a
/// single mutex serializes all access, so operations behave as if handled
/// one request at a time.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Db>>,
}

impl Store {
    pub fn new() -> Self {
        info!("in-memory store initialized");
        Self {
            inner: Arc::new(Mutex::new(Db::default())),
        }
    }

    pub(crate) fn with_data<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Db) -> T,
    {
        let data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&data)
    }

    pub(crate) fn with_data_mut<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Db) -> T,
    {
        let mut data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut data)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity ids look like "task-9f8a0c2d": a kind prefix plus the first 8 hex
/// chars of a v4 UUID. Collisions are treated as negligible, not checked.
pub fn gen_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_format() {
        let id = gen_id("task");
        let (prefix, suffix) = id.split_once('-').unwrap();
        assert_eq!(prefix, "task");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_differ() {
        assert_ne!(gen_id("user"), gen_id("user"));
    }
}
