use serde::{Deserialize, Serialize};

use super::UserRef;

/// Subscription of `user` to the posts of `following`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub user: UserRef,
    pub following: UserRef,
}

#[derive(Debug, Clone, Copy)]
pub struct NewFollow {
    pub user_id: i64,
    pub following_id: i64,
}
