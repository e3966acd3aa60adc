use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Authored, UserRef};

/// Comment left under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author: UserRef,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.author.id
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
}
