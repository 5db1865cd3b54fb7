use crate::{
    Close, Factory, GroupDirectory, LimitPool, Result as StoreErrorResult, StoreError,
};

use idm_core::{ErrorLocation, Identity, IdentityUpdate, PublicKey, Username, dedupe_groups};

use std::collections::BTreeMap;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use uuid::Uuid;

/// Label used for the database pool in errors and metrics
pub const DATABASE_POOL_KIND: &str = "database";

const SELECT_IDENTITY: &str = r#"
    SELECT uuid, username, external_id, owner, email, full_name,
           groups, public_keys, ssh_keys, extra_info, last_login, last_discharge
    FROM identities
    WHERE username = ?
"#;

/// Write transactions take the database lock up front
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

pub type StorePool = LimitPool<IdentityStore>;

pub struct StoreParams {
    pub database_path: PathBuf,
    /// Maximum concurrent sessions, zero for unlimited
    pub max_sessions: usize,
    /// How long a request waits for a free session
    pub request_timeout: Duration,
    pub directory: Arc<dyn GroupDirectory>,
}

/// Create the database if needed, bring its schema up to date and return a
/// session pool over it.
pub async fn open_store_pool(params: StoreParams) -> StoreErrorResult<StorePool> {
    if let Some(parent) = params.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Initialization {
                    message: format!("Failed to create database directory: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&params.database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let mut conn = options.connect().await?;
    sqlx::migrate!("./migrations")
        .run(&mut conn)
        .await
        .map_err(|e| StoreError::Migration {
            message: format!("Migration failed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    conn.close().await?;

    log::info!(
        "Opened identity store at {} (max sessions: {})",
        params.database_path.display(),
        params.max_sessions
    );

    Ok(LimitPool::new(
        DATABASE_POOL_KIND,
        params.max_sessions,
        params.request_timeout,
        SessionFactory {
            options,
            directory: params.directory,
        },
    ))
}

/// Opens a fresh database connection for each new store session.
pub struct SessionFactory {
    options: SqliteConnectOptions,
    directory: Arc<dyn GroupDirectory>,
}

impl SessionFactory {
    pub fn new(options: SqliteConnectOptions, directory: Arc<dyn GroupDirectory>) -> Self {
        Self { options, directory }
    }
}

#[async_trait]
impl Factory<IdentityStore> for SessionFactory {
    async fn create(&self) -> StoreErrorResult<IdentityStore> {
        let conn = self.options.connect().await?;
        Ok(IdentityStore::new(conn, Arc::clone(&self.directory)))
    }
}

/// One session on the identity database.
pub struct IdentityStore {
    conn: SqliteConnection,
    directory: Arc<dyn GroupDirectory>,
}

impl Close for IdentityStore {
    fn close(self) {
        // dropping the connection shuts down its worker
        drop(self.conn);
    }
}

impl IdentityStore {
    pub fn new(conn: SqliteConnection, directory: Arc<dyn GroupDirectory>) -> Self {
        Self { conn, directory }
    }

    /// Insert a new identity or update the one with the same username and
    /// external ID (or owner, for agents).
    ///
    /// `on_insert` is applied only when a new record is created. Returns the
    /// identity as stored.
    pub async fn upsert_identity(
        &mut self,
        doc: &Identity,
        on_insert: Option<&IdentityUpdate>,
    ) -> StoreErrorResult<Identity> {
        doc.validate()?;
        let doc = doc.normalized();

        let mut tx = self.conn.begin_with(BEGIN_IMMEDIATE).await?;
        let stored = upsert(&mut tx, &doc, on_insert).await?;
        tx.commit().await?;

        Ok(stored)
    }

    pub async fn get_identity(&mut self, username: &Username) -> StoreErrorResult<Identity> {
        fetch_existing(&mut self.conn, username).await
    }

    /// Apply a partial update to an existing identity.
    pub async fn update_identity(
        &mut self,
        username: &Username,
        update: &IdentityUpdate,
    ) -> StoreErrorResult<()> {
        let mut tx = self.conn.begin_with(BEGIN_IMMEDIATE).await?;

        let mut identity = fetch_existing(&mut tx, username).await?;
        update.apply_to(&mut identity);
        let columns = EncodedColumns::encode(&identity)?;

        sqlx::query(
            r#"
              UPDATE identities
              SET email = ?, full_name = ?, groups = ?, public_keys = ?, ssh_keys = ?,
                  extra_info = ?, last_login = ?, last_discharge = ?
              WHERE username = ?
              "#,
        )
        .bind(&identity.email)
        .bind(&identity.full_name)
        .bind(&columns.groups)
        .bind(&columns.public_keys)
        .bind(&columns.ssh_keys)
        .bind(&columns.extra_info)
        .bind(identity.last_login)
        .bind(identity.last_discharge)
        .bind(username.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Replace the groups of an identity, leaving every other field alone.
    pub async fn set_groups(
        &mut self,
        username: &Username,
        groups: &[String],
    ) -> StoreErrorResult<()> {
        write_groups(&mut self.conn, username, groups).await
    }

    pub async fn set_public_keys(
        &mut self,
        username: &Username,
        public_keys: &[PublicKey],
    ) -> StoreErrorResult<()> {
        let public_keys = serde_json::to_string(public_keys)?;

        let result = sqlx::query("UPDATE identities SET public_keys = ? WHERE username = ?")
            .bind(public_keys)
            .bind(username.as_str())
            .execute(&mut self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(username.as_str()));
        }
        Ok(())
    }

    /// Groups the external directory reports for a login identifier.
    pub async fn get_external_groups(&self, external_id: &str) -> StoreErrorResult<Vec<String>> {
        self.directory.lookup(external_id).await
    }

    /// Append the external directory's groups to the stored groups of an
    /// interactive identity. Returns the resulting group list.
    ///
    /// The directory is queried before the write transaction opens; the
    /// stored groups are re-read inside it so concurrent writes are kept.
    pub async fn merge_external_groups(
        &mut self,
        username: &Username,
    ) -> StoreErrorResult<Vec<String>> {
        let identity = self.get_identity(username).await?;
        let Some(external_id) = identity.external_id_value().map(str::to_string) else {
            return Ok(identity.groups);
        };
        let external = self.get_external_groups(&external_id).await?;

        let mut tx = self.conn.begin_with(BEGIN_IMMEDIATE).await?;
        let current = fetch_existing(&mut tx, username).await?;
        let merged = dedupe_groups(current.groups.into_iter().chain(external));
        write_groups(&mut tx, username, &merged).await?;
        tx.commit().await?;

        Ok(merged)
    }

    pub async fn count_identities(&mut self) -> StoreErrorResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identities")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count.max(0) as u64)
    }
}

async fn upsert(
    conn: &mut SqliteConnection,
    doc: &Identity,
    on_insert: Option<&IdentityUpdate>,
) -> StoreErrorResult<Identity> {
    let (match_column, match_value) = match doc.owner_value() {
        Some(owner) => ("owner", owner),
        None => ("external_id", doc.external_id_value().unwrap_or_default()),
    };

    let columns = EncodedColumns::encode(doc)?;
    let sql = format!(
        r#"
          UPDATE identities
          SET email = ?, full_name = ?, groups = ?, public_keys = ?, ssh_keys = ?,
              extra_info = ?, last_login = ?, last_discharge = ?
          WHERE username = ? AND {match_column} = ?
          "#
    );
    let updated = sqlx::query(&sql)
        .bind(&doc.email)
        .bind(&doc.full_name)
        .bind(&columns.groups)
        .bind(&columns.public_keys)
        .bind(&columns.ssh_keys)
        .bind(&columns.extra_info)
        .bind(doc.last_login)
        .bind(doc.last_discharge)
        .bind(&doc.username)
        .bind(match_value)
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        let mut inserted = doc.clone();
        if let Some(on_insert) = on_insert {
            on_insert.apply_to(&mut inserted);
        }
        inserted.uuid = Some(Uuid::new_v4());
        insert(conn, &inserted).await?;
        log::debug!("Inserted identity {}", inserted.username);
    }

    fetch(conn, &doc.username)
        .await?
        .ok_or_else(|| StoreError::not_found(&doc.username))
}

async fn insert(conn: &mut SqliteConnection, identity: &Identity) -> StoreErrorResult<()> {
    let columns = EncodedColumns::encode(identity)?;
    let uuid = identity.uuid.map(|u| u.to_string());

    let result = sqlx::query(
        r#"
          INSERT INTO identities (
              uuid, username, external_id, owner, email, full_name,
              groups, public_keys, ssh_keys, extra_info, last_login, last_discharge
          ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
          "#,
    )
    .bind(uuid)
    .bind(&identity.username)
    .bind(identity.external_id_value())
    .bind(identity.owner_value())
    .bind(&identity.email)
    .bind(&identity.full_name)
    .bind(&columns.groups)
    .bind(&columns.public_keys)
    .bind(&columns.ssh_keys)
    .bind(&columns.extra_info)
    .bind(identity.last_login)
    .bind(identity.last_discharge)
    .execute(conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(StoreError::Duplicate {
                location: ErrorLocation::from(Location::caller()),
            })
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_groups(
    conn: &mut SqliteConnection,
    username: &Username,
    groups: &[String],
) -> StoreErrorResult<()> {
    let groups = serde_json::to_string(&dedupe_groups(groups.iter().cloned()))?;

    let result = sqlx::query("UPDATE identities SET groups = ? WHERE username = ?")
        .bind(groups)
        .bind(username.as_str())
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(username.as_str()));
    }
    Ok(())
}

async fn fetch_existing(
    conn: &mut SqliteConnection,
    username: &Username,
) -> StoreErrorResult<Identity> {
    fetch(conn, username.as_str())
        .await?
        .ok_or_else(|| StoreError::not_found(username.as_str()))
}

async fn fetch(conn: &mut SqliteConnection, username: &str) -> StoreErrorResult<Option<Identity>> {
    let row: Option<IdentityRow> = sqlx::query_as(SELECT_IDENTITY)
        .bind(username)
        .fetch_optional(conn)
        .await?;

    row.map(Identity::try_from).transpose()
}

/// JSON text forms of the list and map columns.
struct EncodedColumns {
    groups: String,
    public_keys: String,
    ssh_keys: String,
    extra_info: String,
}

impl EncodedColumns {
    fn encode(identity: &Identity) -> StoreErrorResult<Self> {
        let extra_info: BTreeMap<&str, String> = identity
            .extra_info
            .iter()
            .map(|(k, v)| (k.as_str(), STANDARD.encode(v)))
            .collect();

        Ok(Self {
            groups: serde_json::to_string(&identity.groups)?,
            public_keys: serde_json::to_string(&identity.public_keys)?,
            ssh_keys: serde_json::to_string(&identity.ssh_keys)?,
            extra_info: serde_json::to_string(&extra_info)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    uuid: String,
    username: String,
    external_id: Option<String>,
    owner: Option<String>,
    email: String,
    full_name: String,
    groups: String,
    public_keys: String,
    ssh_keys: String,
    extra_info: String,
    last_login: Option<DateTime<Utc>>,
    last_discharge: Option<DateTime<Utc>>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> StoreErrorResult<Self> {
        let uuid = Uuid::parse_str(&row.uuid)
            .map_err(|e| StoreError::decode(format!("uuid {:?}: {}", row.uuid, e)))?;

        let extra_info: BTreeMap<String, String> = serde_json::from_str(&row.extra_info)?;
        let extra_info = extra_info
            .into_iter()
            .map(|(k, v)| {
                STANDARD
                    .decode(&v)
                    .map(|bytes| (k, bytes))
                    .map_err(|e| StoreError::decode(format!("extra_info: {}", e)))
            })
            .collect::<StoreErrorResult<BTreeMap<_, _>>>()?;

        Ok(Identity {
            uuid: Some(uuid),
            username: row.username,
            external_id: row.external_id,
            owner: row.owner,
            email: row.email,
            full_name: row.full_name,
            groups: serde_json::from_str(&row.groups)?,
            public_keys: serde_json::from_str(&row.public_keys)?,
            ssh_keys: serde_json::from_str(&row.ssh_keys)?,
            extra_info,
            last_login: row.last_login,
            last_discharge: row.last_discharge,
        })
    }
}
