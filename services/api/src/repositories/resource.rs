//! Domain resource repository for database operations
//!
//! One repository serves all five posting surfaces; the kind column keeps
//! the collections apart and the JSONB detail column carries the
//! kind-specific payload.

use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{CurrentUser, Resource, ResourceDetail, ResourceKind, ResourceQuery};

fn row_to_resource(row: &PgRow) -> Result<Resource> {
    let detail_value: serde_json::Value = row.get("detail");
    let detail: ResourceDetail = serde_json::from_value(detail_value)?;

    Ok(Resource {
        id: row.get("id"),
        detail,
        status: row.get("status"),
        attachment: row.get("attachment"),
        posted_by: row.get("posted_by"),
        posted_by_registration: row.get("posted_by_registration"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    })
}

const RESOURCE_COLUMNS: &str =
    "id, kind, status, posted_by, posted_by_registration, user_id, attachment, detail, created_at";

/// Domain resource repository
#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Create a new resource repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a resource, freezing the owner's display fields into the
    /// record at write time
    pub async fn create(
        &self,
        owner: &CurrentUser,
        detail: &ResourceDetail,
        status: Option<&str>,
        attachment: Option<String>,
    ) -> Result<Resource> {
        let kind = detail.kind();
        info!("Creating {} post for user {}", kind.as_str(), owner.id);

        let detail_value = serde_json::to_value(detail)?;

        let row = sqlx::query(
            r#"
            INSERT INTO resources (kind, status, posted_by, posted_by_registration,
                                   user_id, attachment, detail)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, created_at
            "#,
        )
        .bind(kind.as_str())
        .bind(status)
        .bind(&owner.name)
        .bind(&owner.registration_number)
        .bind(owner.id)
        .bind(&attachment)
        .bind(&detail_value)
        .fetch_one(&self.pool)
        .await?;

        Ok(Resource {
            id: row.get("id"),
            detail: detail.clone(),
            status: status.map(str::to_string),
            attachment,
            posted_by: owner.name.clone(),
            posted_by_registration: owner.registration_number.clone(),
            user_id: owner.id,
            created_at: row.get("created_at"),
        })
    }

    /// List resources of one kind, newest first, applying whichever
    /// filters exist on that kind's payload
    pub async fn list(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<Vec<Resource>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE kind = "));
        builder.push_bind(kind.as_str());

        if let Some(status) = query.status_filter() {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(category) = query.category.as_deref() {
            builder
                .push(" AND detail->>'category' = ")
                .push_bind(category.to_string());
        }
        if let Some(service_type) = query.service_type.as_deref() {
            builder
                .push(" AND detail->>'serviceType' = ")
                .push_bind(service_type.to_string());
        }
        if let Some(year) = query.year {
            builder.push(" AND (detail->>'year')::int = ").push_bind(year);
        }
        if let Some(semester) = query.semester {
            builder
                .push(" AND (detail->>'semester')::int = ")
                .push_bind(semester);
        }
        if let Some(branch) = query.branch.as_deref() {
            builder
                .push(" AND detail->>'branch' ILIKE ")
                .push_bind(format!("%{branch}%"));
        }
        if let Some(subject) = query.subject.as_deref() {
            builder
                .push(" AND detail->>'subject' ILIKE ")
                .push_bind(format!("%{subject}%"));
        }
        if let Some(subject_code) = query.subject_code.as_deref() {
            builder
                .push(" AND detail->>'subjectCode' ILIKE ")
                .push_bind(format!("%{subject_code}%"));
        }

        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter().map(row_to_resource).collect()
    }

    /// Find a resource by id within one kind
    pub async fn find(&self, kind: ResourceKind, id: Uuid) -> Result<Option<Resource>> {
        let row = sqlx::query(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1 AND kind = $2"
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_resource(&row)).transpose()
    }

    /// Set a resource's lifecycle status
    pub async fn set_status(&self, id: Uuid, status: &str) -> Result<()> {
        sqlx::query("UPDATE resources SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a resource
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
