use serde::{Deserialize, Serialize};

/// A guild that should receive a reminder for every due event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub community_name: String,
    /// Webhook url the reminders are posted to
    pub endpoint: String,
    /// Role that is pinged in addition to `@everyone`
    pub mention_id: Option<String>,
}

impl NotificationTarget {
    pub fn new(community_name: &str, endpoint: &str, mention_id: Option<&str>) -> Self {
        Self {
            community_name: community_name.to_string(),
            endpoint: endpoint.to_string(),
            mention_id: mention_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from),
        }
    }

    /// The mention prefix of the message content, e.g. `<@&1234> @everyone`
    pub fn mention(&self) -> String {
        match &self.mention_id {
            Some(role_id) => format!("<@&{}> @everyone", role_id),
            None => "@everyone".to_string(),
        }
    }
}

/// Keys targets by `community_name`.
///
/// A duplicated name keeps the position it was first seen at, but the target
/// loaded last wins.
pub fn key_by_community(targets: Vec<NotificationTarget>) -> Vec<NotificationTarget> {
    let mut keyed: Vec<NotificationTarget> = Vec::with_capacity(targets.len());
    for target in targets {
        match keyed
            .iter_mut()
            .find(|t| t.community_name == target.community_name)
        {
            Some(existing) => *existing = target,
            None => keyed.push(target),
        }
    }
    keyed
}
