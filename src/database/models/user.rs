use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::FromRow;

use super::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub family_situation: Option<String>,
    pub work_type: Option<String>,
    pub work_hours: Option<String>,
    pub children_count: Option<i32>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Extra token claims carried alongside the subject (the email).
    pub fn profile_claims(&self) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("firstName".to_string(), json!(self.first_name));
        claims.insert("lastName".to_string(), json!(self.last_name));
        claims.insert("createdAt".to_string(), json!(self.created_at.to_rfc3339()));
        claims
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub family_situation: Option<String>,
    pub work_type: Option<String>,
    pub work_hours: Option<String>,
    pub children_count: Option<i32>,
    pub country: Option<String>,
}

impl UserProfileUpdate {
    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if self.phone_number.is_some() {
            user.phone_number = self.phone_number;
        }
        if self.bio.is_some() {
            user.bio = self.bio;
        }
        if self.avatar_url.is_some() {
            user.avatar_url = self.avatar_url;
        }
        if self.birthday.is_some() {
            user.birthday = self.birthday;
        }
        if self.family_situation.is_some() {
            user.family_situation = self.family_situation;
        }
        if self.work_type.is_some() {
            user.work_type = self.work_type;
        }
        if self.work_hours.is_some() {
            user.work_hours = self.work_hours;
        }
        if self.children_count.is_some() {
            user.children_count = self.children_count;
        }
        if self.country.is_some() {
            user.country = self.country;
        }
        user.updated_at = now;
    }
}
