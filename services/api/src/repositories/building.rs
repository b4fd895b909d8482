//! Campus building repository for the map search

use anyhow::Result;
use sqlx::{PgPool, Row};

use crate::models::Building;

/// Building repository
#[derive(Clone)]
pub struct BuildingRepository {
    pool: PgPool,
}

impl BuildingRepository {
    /// Create a new building repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the first building whose keyword list matches the query,
    /// case-insensitively
    pub async fn search_by_keyword(&self, query: &str) -> Result<Option<Building>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, keywords, latitude, longitude, rooms
            FROM buildings
            WHERE EXISTS (
                SELECT 1 FROM unnest(keywords) AS keyword
                WHERE keyword ILIKE '%' || $1 || '%'
            )
            LIMIT 1
            "#,
        )
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Building {
            id: row.get("id"),
            name: row.get("name"),
            keywords: row.get("keywords"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            rooms: row.get("rooms"),
        }))
    }
}
