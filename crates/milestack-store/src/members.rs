use chrono::Utc;

use milestack_types::api::Teammate;
use milestack_types::models::{Invite, ProjectMember, ROLE_LEADER};

use crate::{Store, gen_id};

impl Store {
    // -- Membership --

    /// Idempotent upsert. An existing row for the pair only has its role
    /// refreshed when it is not "leader" — leadership is permanent.
    pub fn add_member(&self, project_id: &str, user_id: &str, role: &str) -> ProjectMember {
        self.with_data_mut(|db| {
            if let Some(existing) = db
                .project_members
                .iter_mut()
                .find(|m| m.project_id == project_id && m.user_id == user_id)
            {
                if existing.role != ROLE_LEADER {
                    existing.role = role.to_string();
                }
                return existing.clone();
            }

            let entry = ProjectMember {
                id: gen_id("pm"),
                project_id: project_id.to_string(),
                user_id: user_id.to_string(),
                role: role.to_string(),
            };
            db.project_members.push(entry.clone());
            entry
        })
    }

    /// Removes every non-leader row for the pair. Leader rows survive
    /// silently — removing a leader is a policy no-op, not an error.
    pub fn remove_member(&self, project_id: &str, user_id: &str) {
        self.with_data_mut(|db| {
            db.project_members.retain(|m| {
                !(m.project_id == project_id && m.user_id == user_id && m.role != ROLE_LEADER)
            });
        })
    }

    pub fn is_member(&self, project_id: &str, user_id: &str) -> bool {
        self.with_data(|db| {
            db.project_members
                .iter()
                .any(|m| m.project_id == project_id && m.user_id == user_id)
        })
    }

    pub fn is_leader(&self, project_id: &str, user_id: &str) -> bool {
        self.with_data(|db| {
            db.project_members
                .iter()
                .any(|m| m.project_id == project_id && m.user_id == user_id && m.role == ROLE_LEADER)
        })
    }

    pub fn memberships_for_user(&self, user_id: &str) -> Vec<ProjectMember> {
        self.with_data(|db| {
            db.project_members
                .iter()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .collect()
        })
    }

    pub fn members_of(&self, project_id: &str) -> Vec<ProjectMember> {
        self.with_data(|db| {
            db.project_members
                .iter()
                .filter(|m| m.project_id == project_id)
                .cloned()
                .collect()
        })
    }

    /// Membership rows joined with their users, leader sorted first.
    /// Rows whose user no longer exists are skipped.
    pub fn teammates(&self, project_id: &str) -> Vec<Teammate> {
        self.with_data(|db| {
            let mut teammates: Vec<Teammate> = db
                .project_members
                .iter()
                .filter(|m| m.project_id == project_id)
                .filter_map(|m| {
                    let user = db.users.iter().find(|u| u.id == m.user_id)?;
                    Some(Teammate {
                        id: user.id.clone(),
                        name: user.name.clone(),
                        email: user.email.clone(),
                        status: user.status.clone(),
                        role: m.role.clone(),
                    })
                })
                .collect();
            // stable, so same-role teammates keep membership order
            teammates.sort_by_key(|t| if t.role == ROLE_LEADER { 0 } else { 1 });
            teammates
        })
    }

    // -- Invites --

    pub fn create_invite(&self, project_id: &str, email: &str, name: &str) -> Invite {
        self.with_data_mut(|db| {
            let invite = Invite {
                id: gen_id("invite"),
                project_id: project_id.to_string(),
                email: email.to_string(),
                name: name.to_string(),
                status: "pending".to_string(),
                created_at: Utc::now(),
            };
            db.invites.push(invite.clone());
            invite
        })
    }

    pub fn pending_invites_for_project(&self, project_id: &str) -> Vec<Invite> {
        self.with_data(|db| {
            db.invites
                .iter()
                .filter(|i| i.project_id == project_id && i.status == "pending")
                .cloned()
                .collect()
        })
    }

    pub fn all_invites(&self) -> Vec<Invite> {
        self.with_data(|db| db.invites.clone())
    }

    /// Removes and returns every invite addressed to this email. Signup
    /// consumes the result: one membership row and one "joined the project"
    /// activity per invite.
    pub fn take_invites_for_email(&self, email: &str) -> Vec<Invite> {
        self.with_data_mut(|db| {
            let (matching, rest): (Vec<Invite>, Vec<Invite>) =
                db.invites.drain(..).partition(|i| i.email == email);
            db.invites = rest;
            matching
        })
    }
}
