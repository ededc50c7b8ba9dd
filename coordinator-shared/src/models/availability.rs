/// Availability slots
///
/// A slot is a time window on a date, optionally repeating daily, weekly or
/// monthly until `recurrence_end_date`. Expansion into concrete dates happens
/// here rather than in SQL.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const AVAILABILITY_COLUMNS: &str = "id, user_id, date, start_time, end_time, recurring, \
     recurrence_pattern, recurrence_end_date, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurrence_pattern", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Availability {
    pub id: Uuid,
    pub user_id: Uuid,

    /// First (or only) date of the slot
    pub date: NaiveDate,

    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAvailability {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
}

impl CreateAvailability {
    /// Checks the window and recurrence fields agree
    pub fn check(&self) -> Result<(), &'static str> {
        if self.end_time <= self.start_time {
            return Err("end_time must be after start_time");
        }

        match (self.recurring, self.recurrence_pattern) {
            (true, None) => return Err("recurring slots need a recurrence_pattern"),
            (false, Some(_)) => return Err("recurrence_pattern requires recurring"),
            _ => {}
        }

        if let Some(end) = self.recurrence_end_date {
            if !self.recurring {
                return Err("recurrence_end_date requires recurring");
            }
            if end < self.date {
                return Err("recurrence_end_date must not precede date");
            }
        }

        Ok(())
    }
}

impl Availability {
    /// Whether the slot applies on `day`
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        if day < self.date {
            return false;
        }

        if !self.recurring {
            return day == self.date;
        }

        if matches!(self.recurrence_end_date, Some(end) if day > end) {
            return false;
        }

        match self.recurrence_pattern {
            Some(RecurrencePattern::Daily) => true,
            Some(RecurrencePattern::Weekly) => day.weekday() == self.date.weekday(),
            Some(RecurrencePattern::Monthly) => day.day() == self.date.day(),
            None => day == self.date,
        }
    }

    /// Dates in `from..=to` on which the slot applies
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let start = from.max(self.date);
        let end = match self.recurrence_end_date {
            Some(limit) if self.recurring => to.min(limit),
            _ if !self.recurring => to.min(self.date),
            _ => to,
        };

        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.occurs_on(*day))
            .collect()
    }

    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: CreateAvailability,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO availability (user_id, date, start_time, end_time, recurring,
                                      recurrence_pattern, recurrence_end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {AVAILABILITY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Availability>(&query)
            .bind(user_id)
            .bind(data.date)
            .bind(data.start_time)
            .bind(data.end_time)
            .bind(data.recurring)
            .bind(data.recurrence_pattern)
            .bind(data.recurrence_end_date)
            .fetch_one(pool)
            .await
    }

    /// Slots that may apply within `from..=to`
    ///
    /// Recurring slots are returned whenever their series overlaps the range;
    /// use [`Availability::occurrences_between`] for exact dates.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {AVAILABILITY_COLUMNS}
            FROM availability
            WHERE user_id = $1
              AND date <= $3
              AND (date >= $2
                   OR (recurring AND (recurrence_end_date IS NULL OR recurrence_end_date >= $2)))
            ORDER BY date, start_time
            "#
        );

        sqlx::query_as::<_, Availability>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Deletes a slot owned by `user_id`
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM availability WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn slot(pattern: Option<RecurrencePattern>, end: Option<NaiveDate>) -> Availability {
        Availability {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            // Monday
            date: date(2025, 6, 2),
            start_time: time(10),
            end_time: time(14),
            recurring: pattern.is_some(),
            recurrence_pattern: pattern,
            recurrence_end_date: end,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_slot() {
        let s = slot(None, None);
        assert!(s.occurs_on(date(2025, 6, 2)));
        assert!(!s.occurs_on(date(2025, 6, 3)));
        assert!(!s.occurs_on(date(2025, 6, 9)));
    }

    #[test]
    fn test_weekly_slot() {
        let s = slot(Some(RecurrencePattern::Weekly), Some(date(2025, 6, 30)));
        assert!(s.occurs_on(date(2025, 6, 9)));
        assert!(s.occurs_on(date(2025, 6, 30)));
        assert!(!s.occurs_on(date(2025, 6, 10)));
        assert!(!s.occurs_on(date(2025, 7, 7)));
        assert!(!s.occurs_on(date(2025, 5, 26)));
    }

    #[test]
    fn test_monthly_slot() {
        let s = slot(Some(RecurrencePattern::Monthly), None);
        assert!(s.occurs_on(date(2025, 7, 2)));
        assert!(s.occurs_on(date(2026, 1, 2)));
        assert!(!s.occurs_on(date(2025, 7, 3)));
    }

    #[test]
    fn test_occurrences_between() {
        let weekly = slot(Some(RecurrencePattern::Weekly), Some(date(2025, 6, 20)));
        assert_eq!(
            weekly.occurrences_between(date(2025, 6, 1), date(2025, 6, 30)),
            vec![date(2025, 6, 2), date(2025, 6, 9), date(2025, 6, 16)]
        );

        let daily = slot(Some(RecurrencePattern::Daily), None);
        assert_eq!(
            daily.occurrences_between(date(2025, 6, 10), date(2025, 6, 12)).len(),
            3
        );

        let single = slot(None, None);
        assert_eq!(
            single.occurrences_between(date(2025, 6, 1), date(2025, 6, 30)),
            vec![date(2025, 6, 2)]
        );
        assert!(single
            .occurrences_between(date(2025, 6, 3), date(2025, 6, 30))
            .is_empty());
    }

    #[test]
    fn test_create_check() {
        let mut input = CreateAvailability {
            date: date(2025, 6, 2),
            start_time: time(10),
            end_time: time(12),
            recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
        };
        assert!(input.check().is_ok());

        input.end_time = time(9);
        assert!(input.check().is_err());
        input.end_time = time(12);

        input.recurring = true;
        assert!(input.check().is_err());

        input.recurrence_pattern = Some(RecurrencePattern::Weekly);
        assert!(input.check().is_ok());

        input.recurrence_end_date = Some(date(2025, 5, 1));
        assert!(input.check().is_err());
    }
}
