use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Teams
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub members_count: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTeamInput {
    pub name: String,
}

// ============================================================================
// Membership
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddMemberInput {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: MemberRole,
}
