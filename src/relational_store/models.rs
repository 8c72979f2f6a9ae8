use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    User,
    Moderator,
    Admin,
}

impl ProfileRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileRole::User => "user",
            ProfileRole::Moderator => "moderator",
            ProfileRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(ProfileRole::User),
            "moderator" => Some(ProfileRole::Moderator),
            "admin" => Some(ProfileRole::Admin),
            _ => None,
        }
    }

    pub fn is_elevated(self) -> bool {
        self == ProfileRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: ProfileRole,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub full_name: Option<String>,
    pub role: ProfileRole,
}

/// Content fields of an article that the CMS owns. Everything else on the
/// row (author, registration data, bookkeeping) belongs to the relational side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArticleFields {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub cover_image: Option<String>,
    pub series_id: Option<String>,
    pub published_at: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: String,
    pub sanity_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub author_id: Option<String>,
    pub cover_image: Option<String>,
    pub series_id: Option<String>,
    pub published_at: Option<String>,
    pub created_at: i64,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFields {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub cover_image: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub sanity_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub registration_count: i64,
    pub cover_image: Option<String>,
    pub created_at: i64,
    pub updated_at: String,
}

impl Event {
    pub fn accepts_registrations(&self) -> bool {
        !matches!(self.status.as_str(), "cancelled" | "deleted" | "draft")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(RegistrationStatus::Confirmed),
            "cancelled" => Some(RegistrationStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub attendee_details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub attendee_details: Option<serde_json::Value>,
    pub status: RegistrationStatus,
    pub created_at: i64,
    pub cancelled_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub subscribed_at: i64,
    pub unsubscribed_at: Option<i64>,
}

impl Subscriber {
    pub fn is_active(&self) -> bool {
        self.unsubscribed_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RoleRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleRequestStatus::Pending => "pending",
            RoleRequestStatus::Approved => "approved",
            RoleRequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RoleRequestStatus::Pending),
            "approved" => Some(RoleRequestStatus::Approved),
            "rejected" => Some(RoleRequestStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRequest {
    pub id: String,
    pub user_id: String,
    pub requested_role: ProfileRole,
    pub reason: Option<String>,
    pub status: RoleRequestStatus,
    pub reviewed_by: Option<String>,
    pub feedback: Option<String>,
    pub created_at: i64,
    pub reviewed_at: Option<i64>,
}
