use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Authored, UserRef};

/// Post entity - a single publication.
///
/// `pub_date` is assigned by the store on insert and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: UserRef,
    /// Storage path of the attached image, relative to the media root.
    pub image: Option<String>,
    pub group_id: Option<i64>,
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.author.id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: i64,
    pub image: Option<String>,
    pub group_id: Option<i64>,
}

/// Mutable fields of a post. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: Option<String>,
    pub image: Option<Option<String>>,
    pub group_id: Option<Option<i64>>,
}
