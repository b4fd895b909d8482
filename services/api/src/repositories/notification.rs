//! Notification repository for database operations
//!
//! Every operation is scoped to the owning user; an id belonging to
//! someone else behaves exactly like a missing id.

use anyhow::{Result, anyhow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::notification::{Notification, NotificationKind};

fn row_to_notification(row: &PgRow) -> Result<Notification> {
    let kind: String = row.get("kind");
    let kind = NotificationKind::parse(&kind)
        .ok_or_else(|| anyhow!("unknown notification kind: {kind}"))?;

    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        title: row.get("title"),
        message: row.get("message"),
        resource_id: row.get("resource_id"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, title, message, resource_id, read, created_at";

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create one notification for one user
    pub async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: &str,
        resource_id: Option<Uuid>,
    ) -> Result<Notification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, resource_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(kind.as_str())
        .bind(title)
        .bind(message)
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await?;

        row_to_notification(&row)
    }

    /// Create one notification row per registered user in a single bulk
    /// insert. Returns how many rows were written.
    pub async fn create_for_all_users(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        resource_id: Option<Uuid>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, resource_id)
            SELECT id, $1, $2, $3, $4 FROM users
            "#,
        )
        .bind(kind.as_str())
        .bind(title)
        .bind(message)
        .bind(resource_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Page through a user's inbox, newest first, with the total count
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
        unread_only: bool,
    ) -> Result<(Vec<Notification>, i64)> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = i64::from(page - 1) * i64::from(limit);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = "
        ));
        builder.push_bind(user_id);
        if unread_only {
            builder.push(" AND read = FALSE");
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(i64::from(limit));
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let notifications: Vec<Notification> =
            rows.iter().map(row_to_notification).collect::<Result<_>>()?;

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM notifications WHERE user_id = ");
        count_builder.push_bind(user_id);
        if unread_only {
            count_builder.push(" AND read = FALSE");
        }

        let total: i64 = count_builder.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((notifications, total))
    }

    /// Number of unread notifications for a user
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one notification read. Yields nothing when the id does not
    /// exist or belongs to another user.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_notification(&row)).transpose()
    }

    /// Mark all of a user's notifications read
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Delete one notification; false when the id does not exist or
    /// belongs to another user
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all of a user's notifications
    pub async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
