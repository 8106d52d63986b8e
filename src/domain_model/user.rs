use super::Subject;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Public view of an account as returned by the identity store.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Subject,
    pub username: String,
    pub email: String,
    pub fullname: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}
