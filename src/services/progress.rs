//! Streak, wellness score and achievements, computed from activity counts.
//!
//! Everything here is pure. Counters come from the store, the report is built
//! fresh on every request and nothing is persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::database::models::{User, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("{0} must not be negative")]
    InvalidInput(&'static str),
}

/// Activity totals for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounters {
    pub mood_logs: i64,
    pub conversations: i64,
    pub messages: i64,
    pub account_age_days: i64,
}

impl ActivityCounters {
    fn check(&self) -> Result<(), ProgressError> {
        for (name, value) in [
            ("moodLogCount", self.mood_logs),
            ("conversationCount", self.conversations),
            ("messageCount", self.messages),
            ("accountAgeDays", self.account_age_days),
        ] {
            if value < 0 {
                return Err(ProgressError::InvalidInput(name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub user_id: UserId,
    pub user_name: String,
    pub member_since: DateTime<Utc>,
    pub total_mood_logs: i64,
    pub mood_streak: i64,
    pub total_conversations: i64,
    pub total_messages: i64,
    pub days_since_registration: i64,
    pub wellness_score: i64,
    pub achievements: Vec<Achievement>,
}

/// Count-bucketed streak: 0, then 1..=6, then 7, 14 or 30.
pub fn streak(mood_logs: i64) -> Result<i64, ProgressError> {
    if mood_logs < 0 {
        return Err(ProgressError::InvalidInput("moodLogCount"));
    }
    Ok(match mood_logs {
        0..=6 => mood_logs,
        7..=13 => 7,
        14..=29 => 14,
        _ => 30,
    })
}

/// Composite score in `0..=100`.
pub fn wellness_score(
    mood_logs: i64,
    conversations: i64,
    streak: i64,
    account_age_days: i64,
) -> Result<i64, ProgressError> {
    ActivityCounters {
        mood_logs,
        conversations,
        messages: 0,
        account_age_days,
    }
    .check()?;
    if streak < 0 {
        return Err(ProgressError::InvalidInput("streak"));
    }

    let frequency = if account_age_days > 0 {
        (mood_logs.saturating_mul(40) / account_age_days).min(40)
    } else {
        0
    };
    let streak_points = streak.saturating_mul(3).min(20);
    let conversation_points = conversations.saturating_mul(2).min(20);
    let engagement = (mood_logs.saturating_add(conversations) / 2).min(20);

    Ok((frequency + streak_points + conversation_points + engagement).min(100))
}

struct Milestone {
    name: &'static str,
    icon: &'static str,
    unlocked_text: &'static str,
    locked_text: &'static str,
    reached: fn(i64, i64, i64) -> bool,
}

const MILESTONES: [Milestone; 6] = [
    Milestone {
        name: "First Step",
        icon: "🌱",
        unlocked_text: "Logged your first mood",
        locked_text: "Log your first mood",
        reached: |mood, _, _| mood >= 1,
    },
    Milestone {
        name: "Week Warrior",
        icon: "🎯",
        unlocked_text: "7 mood logs recorded",
        locked_text: "Log 7 moods",
        reached: |mood, _, _| mood >= 7,
    },
    Milestone {
        name: "Monthly Master",
        icon: "🏆",
        unlocked_text: "30 mood logs recorded",
        locked_text: "Log 30 moods",
        reached: |mood, _, _| mood >= 30,
    },
    Milestone {
        name: "Conversation Starter",
        icon: "💬",
        unlocked_text: "Started your first chat",
        locked_text: "Start a chat with ZenBot",
        reached: |_, conversations, _| conversations >= 1,
    },
    Milestone {
        name: "Regular Talker",
        icon: "🗣️",
        unlocked_text: "10 conversations completed",
        locked_text: "Have 10 conversations",
        reached: |_, conversations, _| conversations >= 10,
    },
    Milestone {
        name: "Week Streak",
        icon: "🔥",
        unlocked_text: "7 day logging streak",
        locked_text: "Maintain a 7 day streak",
        reached: |_, _, streak| streak >= 7,
    },
];

/// All six achievements, always in the same order.
pub fn achievements(
    mood_logs: i64,
    conversations: i64,
    streak: i64,
) -> Result<Vec<Achievement>, ProgressError> {
    if mood_logs < 0 {
        return Err(ProgressError::InvalidInput("moodLogCount"));
    }
    if conversations < 0 {
        return Err(ProgressError::InvalidInput("conversationCount"));
    }
    if streak < 0 {
        return Err(ProgressError::InvalidInput("streak"));
    }

    Ok(MILESTONES
        .iter()
        .map(|m| {
            let unlocked = (m.reached)(mood_logs, conversations, streak);
            Achievement {
                name: m.name,
                description: if unlocked { m.unlocked_text } else { m.locked_text },
                icon: m.icon,
                unlocked,
            }
        })
        .collect())
}

/// Whole days between the account's creation date and `now`, never negative.
pub fn account_age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let created: NaiveDate = created_at.date_naive();
    let today: NaiveDate = now.date_naive();
    (today - created).num_days().max(0)
}

pub fn build_report(user: &User, counters: ActivityCounters) -> Result<ProgressReport, ProgressError> {
    counters.check()?;

    let mood_streak = streak(counters.mood_logs)?;
    let wellness_score = wellness_score(
        counters.mood_logs,
        counters.conversations,
        mood_streak,
        counters.account_age_days,
    )?;
    let achievements = achievements(counters.mood_logs, counters.conversations, mood_streak)?;

    Ok(ProgressReport {
        user_id: user.id,
        user_name: user.full_name(),
        member_since: user.created_at,
        total_mood_logs: counters.mood_logs,
        mood_streak,
        total_conversations: counters.conversations,
        total_messages: counters.messages,
        days_since_registration: counters.account_age_days,
        wellness_score,
        achievements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn streak_buckets() {
        let cases = [
            (0, 0),
            (1, 1),
            (6, 6),
            (7, 7),
            (13, 7),
            (14, 14),
            (29, 14),
            (30, 30),
            (1000, 30),
        ];
        for (count, expected) in cases {
            assert_eq!(streak(count), Ok(expected), "streak({})", count);
        }
    }

    #[test]
    fn empty_account_scores_zero() {
        assert_eq!(wellness_score(0, 0, 0, 0), Ok(0));
    }

    #[test]
    fn brand_new_account_skips_frequency_term() {
        // 5 logs, streak 5 → 15 streak points + 2 engagement; no division by zero
        assert_eq!(wellness_score(5, 0, 5, 0), Ok(17));
    }

    #[test]
    fn frequency_saturates_at_one_log_per_day() {
        for days in [1, 3, 10, 60] {
            assert_eq!(wellness_score(days, 0, 0, days), Ok(40 + (days / 2).min(20)));
            assert_eq!(wellness_score(days * 2, 0, 0, days), Ok(40 + days.min(20)));
        }
        // 40 * 3 / 10 = 12, plus one engagement point
        assert_eq!(wellness_score(3, 0, 0, 10), Ok(13));
    }

    #[test]
    fn score_is_capped_at_100() {
        assert_eq!(wellness_score(35, 15, 30, 10), Ok(100));
        assert_eq!(wellness_score(i64::MAX, i64::MAX, i64::MAX, 1), Ok(100));
    }

    #[test]
    fn negative_inputs_are_rejected() {
        assert!(streak(-1).is_err());
        assert!(wellness_score(-1, 0, 0, 0).is_err());
        assert!(wellness_score(0, -1, 0, 0).is_err());
        assert!(wellness_score(0, 0, -1, 0).is_err());
        assert!(wellness_score(0, 0, 0, -1).is_err());
        assert!(achievements(0, -3, 0).is_err());
    }

    #[test]
    fn achievements_keep_order_and_thresholds() {
        let names: Vec<&str> = achievements(0, 0, 0).unwrap().iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            [
                "First Step",
                "Week Warrior",
                "Monthly Master",
                "Conversation Starter",
                "Regular Talker",
                "Week Streak"
            ]
        );

        let six = achievements(6, 0, streak(6).unwrap()).unwrap();
        assert!(six[0].unlocked);
        assert!(!six[1].unlocked);
        assert_eq!(six[1].description, "Log 7 moods");

        let seven = achievements(7, 0, streak(7).unwrap()).unwrap();
        assert!(seven[1].unlocked);
        assert!(seven[5].unlocked);
        assert_eq!(seven[1].description, "7 mood logs recorded");

        let talker = achievements(0, 10, 0).unwrap();
        assert!(talker[3].unlocked && talker[4].unlocked);
        assert!(!talker[0].unlocked);

        assert_eq!(achievements(1_000_000, 1_000_000, 30).unwrap().len(), 6);
    }

    #[test]
    fn account_age_counts_calendar_days() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(account_age_days(created, created), 0);
        assert_eq!(account_age_days(created, created + Duration::hours(1)), 1);
        assert_eq!(account_age_days(created, created + Duration::days(10)), 10);
        assert_eq!(account_age_days(created, created - Duration::days(2)), 0);
    }

    #[test]
    fn report_for_busy_user_is_saturated() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let user = User {
            id: 1,
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: None,
            bio: None,
            avatar_url: None,
            birthday: None,
            family_situation: None,
            work_type: None,
            work_hours: None,
            children_count: None,
            country: None,
            created_at: at,
            updated_at: at,
        };

        let busy = ActivityCounters {
            mood_logs: 35,
            conversations: 15,
            messages: 30,
            account_age_days: 35,
        };
        let report = build_report(&user, busy).unwrap();

        assert_eq!(report.user_name, "Ada Lovelace");
        assert_eq!(report.mood_streak, 30);
        assert_eq!(report.wellness_score, 100);
        assert!(report.achievements.iter().all(|a| a.unlocked));

        // fewer than one log per day: 40 * 35 / 40 = 35 frequency points
        let older = ActivityCounters {
            account_age_days: 40,
            ..busy
        };
        assert_eq!(build_report(&user, older).unwrap().wellness_score, 95);
    }
}
