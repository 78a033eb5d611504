#![allow(dead_code)]
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use uuid::Uuid;

use super::models::{Endpoint, i64_to_timestamp, timestamp_to_i64};
use crate::monitoring::types::{CheckRecord, CheckStatus};
use crate::pool::LibsqlPool;

/// Store trait - endpoint registry reads plus the append-only check store.
#[async_trait]
pub trait Store: Send + Sync {
    /// All registered endpoints, each cycle re-fetches this list.
    async fn list_endpoints(&self) -> Result<Vec<Endpoint>>;

    async fn get_endpoint(&self, uuid: Uuid) -> Result<Option<Endpoint>>;

    async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<i64>;

    /// Cascades to the endpoint's check records.
    async fn delete_endpoint(&self, uuid: Uuid) -> Result<()>;

    /// One self-contained insert; concurrent appends never block each other.
    async fn append_check(&self, record: &CheckRecord) -> Result<i64>;

    /// Checks in `[from, to)`, ordered by timestamp ascending.
    async fn checks_in_range(
        &self,
        endpoint_uuid: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CheckRecord>>;

    async fn latest_check(&self, endpoint_uuid: Uuid) -> Result<Option<CheckRecord>>;
}

/// LibSQL store implementation backed by the connection pool.
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<crate::pool::LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

fn endpoint_from_row(row: &libsql::Row) -> Result<Endpoint> {
    let uuid_str: String = row.get(1)?;

    Ok(Endpoint {
        id: Some(row.get(0)?),
        uuid: Uuid::parse_str(&uuid_str)?,
        name: row.get(2)?,
        url: row.get(3)?,
        category: row.get(4)?,
        created_at: i64_to_timestamp(row.get(5)?),
        updated_at: i64_to_timestamp(row.get(6)?),
    })
}

fn check_from_row(row: &libsql::Row) -> Result<CheckRecord> {
    let endpoint_uuid_str: String = row.get(0)?;
    let status_str: String = row.get(2)?;

    Ok(CheckRecord {
        endpoint_id: Uuid::parse_str(&endpoint_uuid_str)?,
        timestamp: i64_to_timestamp(row.get(1)?),
        status: match status_str.as_str() {
            "UP" => CheckStatus::Up,
            _ => CheckStatus::Down,
        },
        status_code: row.get::<Option<i64>>(3)?.map(|v| v as u16),
        response_time_ms: row.get::<Option<i64>>(4)?.map(|v| v as u64),
        error_message: row.get(5)?,
    })
}

const ENDPOINT_COLUMNS: &str = "id, uuid, name, url, category, created_at, updated_at";
const CHECK_COLUMNS: &str =
    "endpoint_uuid, timestamp, status, status_code, response_time_ms, error_message";

#[async_trait]
impl Store for LibsqlStore {
    async fn list_endpoints(&self) -> Result<Vec<Endpoint>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {ENDPOINT_COLUMNS} FROM endpoints ORDER BY name"))
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut endpoints = Vec::new();

        while let Some(row) = rows.next().await? {
            endpoints.push(endpoint_from_row(&row)?);
        }

        Ok(endpoints)
    }

    async fn get_endpoint(&self, uuid: Uuid) -> Result<Option<Endpoint>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {ENDPOINT_COLUMNS} FROM endpoints WHERE uuid = ?"))
            .await?;

        let mut rows = stmt.query(params![uuid.to_string()]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(endpoint_from_row(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn create_endpoint(&self, endpoint: &Endpoint) -> Result<i64> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO endpoints (uuid, name, url, category, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                endpoint.uuid.to_string(),
                endpoint.name.clone(),
                endpoint.url.clone(),
                endpoint.category.clone(),
                timestamp_to_i64(endpoint.created_at),
                timestamp_to_i64(endpoint.updated_at)
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn delete_endpoint(&self, uuid: Uuid) -> Result<()> {
        let conn = self.get_conn().await?;

        // Check records go with it via ON DELETE CASCADE.
        conn.execute("DELETE FROM endpoints WHERE uuid = ?", params![uuid.to_string()]).await?;
        Ok(())
    }

    async fn append_check(&self, record: &CheckRecord) -> Result<i64> {
        let conn = self.get_conn().await?;

        conn.execute(
            &format!("INSERT INTO checks ({CHECK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
            params![
                record.endpoint_id.to_string(),
                timestamp_to_i64(record.timestamp),
                record.status.to_string(),
                record.status_code.map(|v| v as i64),
                record.response_time_ms.map(|v| v as i64),
                record.error_message.clone()
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn checks_in_range(
        &self,
        endpoint_uuid: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CheckRecord>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CHECK_COLUMNS} FROM checks WHERE endpoint_uuid = ? AND timestamp >= ? AND timestamp < ? ORDER BY timestamp ASC, id ASC"
            ))
            .await?;

        let mut rows = stmt
            .query(params![
                endpoint_uuid.to_string(),
                timestamp_to_i64(from),
                timestamp_to_i64(to)
            ])
            .await?;
        let mut records = Vec::new();

        while let Some(row) = rows.next().await? {
            records.push(check_from_row(&row)?);
        }

        Ok(records)
    }

    async fn latest_check(&self, endpoint_uuid: Uuid) -> Result<Option<CheckRecord>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CHECK_COLUMNS} FROM checks WHERE endpoint_uuid = ? ORDER BY timestamp DESC, id DESC LIMIT 1"
            ))
            .await?;

        let mut rows = stmt.query(params![endpoint_uuid.to_string()]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(check_from_row(&row)?))
        } else {
            Ok(None)
        }
    }
}
