//! PostgreSQL credential store.
//!
//! Uses runtime queries so building does not need a live database.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use super::{CredentialInfo, CredentialStore, NewCredential, StoreError, StoredCredentialRecord};

/// PostgreSQL connection pool.
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(50)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations applied");
        Ok(())
    }
}

/// `apikeys` table access.
pub struct PgCredentialStore {
    db: Database,
}

impl PgCredentialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn row_to_info(row: &PgRow) -> Result<CredentialInfo, sqlx::Error> {
        Ok(CredentialInfo {
            id: row.try_get("id")?,
            subject: row.try_get("sub")?,
            name: row.try_get("name")?,
            algorithm: row.try_get("alg")?,
            public_key: row.try_get("key")?,
            expires_at: row.try_get("exp")?,
            extra: row.try_get("extra")?,
        })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get_credential_for_verify(
        &self,
        id: i64,
    ) -> Result<Option<StoredCredentialRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sec, key, sub, alg::text AS alg, exp, extra
            FROM apikeys
            WHERE id = $1 AND (exp IS NULL OR exp > NOW())
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(StoredCredentialRecord {
            id: row.try_get("id")?,
            secret_hash: row.try_get("sec")?,
            public_key: row.try_get("key")?,
            algorithm: row.try_get("alg")?,
            subject: row.try_get("sub")?,
            expires_at: row.try_get("exp")?,
            extra: row.try_get("extra")?,
        }))
    }

    async fn insert(&self, credential: NewCredential) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO apikeys (sec, key, sub, alg, exp, name, extra)
            VALUES ($1, $2, $3, $4::alg_type, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&credential.secret_hash)
        .bind(&credential.public_key)
        .bind(&credential.subject)
        .bind(&credential.algorithm)
        .bind(credential.expires_at)
        .bind(&credential.name)
        .bind(&credential.extra)
        .fetch_one(self.db.pool())
        .await?;

        tracing::debug!(credential_id = id, sub = %credential.subject, "Credential inserted");
        Ok(id)
    }

    async fn search_by_subject(&self, subject: &str) -> Result<Vec<CredentialInfo>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, sub, alg::text AS alg, exp, name, extra
            FROM apikeys
            WHERE sub = $1
            ORDER BY id
            "#,
        )
        .bind(subject)
        .fetch_all(self.db.pool())
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::row_to_info(&row)?);
        }
        Ok(out)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CredentialInfo>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, key, sub, alg::text AS alg, exp, name, extra
            FROM apikeys
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_info(&r)?)),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.db.health_check().await?;
        Ok(())
    }
}
