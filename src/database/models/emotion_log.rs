use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmotionLog {
    pub id: i64,
    pub user_id: UserId,
    pub emotion_type: String,
    pub intensity: Option<i32>,
    pub activities: Option<String>,
    pub note: Option<String>,
    pub source: String,
    pub confidence: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// How a mood entry was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionSource {
    #[default]
    Manual,
    FaceAnalysis,
}

impl EmotionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EmotionSource::Manual => "MANUAL",
            EmotionSource::FaceAnalysis => "FACE_ANALYSIS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEmotionLog {
    pub user_id: UserId,
    pub emotion_type: String,
    pub intensity: Option<i32>,
    pub activities: Option<String>,
    pub note: Option<String>,
    pub source: EmotionSource,
    pub confidence: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}
