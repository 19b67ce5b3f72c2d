use serde::{Deserialize, Serialize};

/// Ties a user to a tracked product. The `(user_id, link_id)` pair is the
/// composite unique key; a user subscribes to a product at most once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: String,
    pub link_id: String,
}

impl Subscription {
    pub fn new(user_id: impl Into<String>, link_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            link_id: link_id.into(),
        }
    }
}
