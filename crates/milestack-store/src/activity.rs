use chrono::Utc;

use milestack_types::models::Activity;

use crate::{Store, gen_id};

impl Store {
    /// Append one immutable feed entry. The description arrives pre-formatted
    /// ("created task: ship v2") — no templating happens here.
    pub fn log_activity(&self, project_id: &str, user_id: &str, description: &str) -> Activity {
        self.with_data_mut(|db| {
            let activity = Activity {
                id: gen_id("act"),
                project_id: project_id.to_string(),
                user_id: user_id.to_string(),
                description: description.to_string(),
                timestamp: Utc::now(),
            };
            db.activities.push(activity.clone());
            activity
        })
    }

    /// Project feed, newest first. Timestamp ties keep store order.
    pub fn project_activities(&self, project_id: &str) -> Vec<Activity> {
        self.with_data(|db| {
            let mut activities: Vec<Activity> = db
                .activities
                .iter()
                .filter(|a| a.project_id == project_id)
                .cloned()
                .collect();
            activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            activities
        })
    }
}
