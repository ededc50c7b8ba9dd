/// Musician profile, instruments played and genres
///
/// One profile per musician account, created at registration. Instrument and
/// genre sets are replaced wholesale inside a transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::catalog::Genre;

/// Highest proficiency level
pub const MAX_PROFICIENCY: i16 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusicianProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub years_experience: i32,
    pub studio_experience: bool,
    pub remote_recording_capability: bool,
    pub portfolio_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `None` keeps the stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMusicianProfile {
    pub years_experience: Option<i32>,
    pub studio_experience: Option<bool>,
    pub remote_recording_capability: Option<bool>,
    pub portfolio_url: Option<String>,
}

/// An instrument a musician plays, joined with the catalog entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlayedInstrument {
    pub instrument_id: Uuid,
    pub name: String,
    pub category: String,
    pub proficiency_level: i16,
}

/// Requested instrument for [`MusicianProfile::set_instruments`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InstrumentSkill {
    pub instrument_id: Uuid,
    pub proficiency_level: i16,
}

impl InstrumentSkill {
    pub fn is_valid(&self) -> bool {
        (1..=MAX_PROFICIENCY).contains(&self.proficiency_level)
    }
}

impl MusicianProfile {
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MusicianProfile>(
            r#"
            SELECT id, user_id, years_experience, studio_experience,
                   remote_recording_capability, portfolio_url, created_at, updated_at
            FROM musician_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Updates the profile, creating it first if the musician has none
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        data: UpdateMusicianProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, MusicianProfile>(
            r#"
            INSERT INTO musician_profiles (user_id, years_experience, studio_experience,
                                           remote_recording_capability, portfolio_url)
            VALUES ($1, COALESCE($2, 0), COALESCE($3, FALSE), COALESCE($4, FALSE), $5)
            ON CONFLICT (user_id) DO UPDATE
            SET years_experience = COALESCE($2, musician_profiles.years_experience),
                studio_experience = COALESCE($3, musician_profiles.studio_experience),
                remote_recording_capability =
                    COALESCE($4, musician_profiles.remote_recording_capability),
                portfolio_url = COALESCE($5, musician_profiles.portfolio_url),
                updated_at = NOW()
            RETURNING id, user_id, years_experience, studio_experience,
                      remote_recording_capability, portfolio_url, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(data.years_experience)
        .bind(data.studio_experience)
        .bind(data.remote_recording_capability)
        .bind(data.portfolio_url)
        .fetch_one(pool)
        .await
    }

    pub async fn instruments(
        pool: &PgPool,
        profile_id: Uuid,
    ) -> Result<Vec<PlayedInstrument>, sqlx::Error> {
        sqlx::query_as::<_, PlayedInstrument>(
            r#"
            SELECT i.id AS instrument_id, i.name, i.category, mi.proficiency_level
            FROM musician_instruments mi
            JOIN instruments i ON i.id = mi.instrument_id
            WHERE mi.musician_profile_id = $1
            ORDER BY mi.proficiency_level DESC, i.name
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }

    pub async fn genres(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name, g.created_at, g.updated_at
            FROM musician_genres mg
            JOIN genres g ON g.id = mg.genre_id
            WHERE mg.musician_profile_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }

    /// Replaces the instruments a musician plays
    ///
    /// # Errors
    ///
    /// A foreign key violation if an instrument does not exist; nothing is
    /// changed in that case.
    pub async fn set_instruments(
        pool: &PgPool,
        profile_id: Uuid,
        skills: &[InstrumentSkill],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM musician_instruments WHERE musician_profile_id = $1")
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        for skill in skills {
            sqlx::query(
                r#"
                INSERT INTO musician_instruments (musician_profile_id, instrument_id, proficiency_level)
                VALUES ($1, $2, $3)
                ON CONFLICT (musician_profile_id, instrument_id)
                DO UPDATE SET proficiency_level = EXCLUDED.proficiency_level, updated_at = NOW()
                "#,
            )
            .bind(profile_id)
            .bind(skill.instrument_id)
            .bind(skill.proficiency_level)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Replaces the genres a musician plays
    pub async fn set_genres(
        pool: &PgPool,
        profile_id: Uuid,
        genre_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM musician_genres WHERE musician_profile_id = $1")
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        for genre_id in genre_ids {
            sqlx::query(
                r#"
                INSERT INTO musician_genres (musician_profile_id, genre_id)
                VALUES ($1, $2)
                ON CONFLICT (musician_profile_id, genre_id) DO NOTHING
                "#,
            )
            .bind(profile_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_skill_range() {
        let mut skill = InstrumentSkill {
            instrument_id: Uuid::new_v4(),
            proficiency_level: 1,
        };
        assert!(skill.is_valid());

        skill.proficiency_level = MAX_PROFICIENCY;
        assert!(skill.is_valid());

        skill.proficiency_level = 0;
        assert!(!skill.is_valid());

        skill.proficiency_level = 6;
        assert!(!skill.is_valid());
    }
}
