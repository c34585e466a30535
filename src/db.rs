use std::{future::Future, path::PathBuf};

use anyhow::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, RuntimeErr, Statement,
    TransactionTrait,
};
use sqlx::postgres::PgPoolOptions;
use tokio::fs;

use crate::error::{AppError, AppResult};

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

// Arbitrary key shared by every process that runs migrations.
const MIGRATION_LOCK_KEY: i64 = 0x0c1e_b00c;

/// Create the raw sqlx pool used for audit logging and seeding.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Executes SQL files in `migrations/` in filename order, inside one transaction.
///
/// An advisory lock serializes concurrent runners (several test binaries, or a
/// server starting next to `bin/migrate`), so `IF NOT EXISTS` DDL never races.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<usize> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    let txn = conn.begin().await?;
    txn.execute(Statement::from_string(
        backend,
        format!("SELECT pg_advisory_xact_lock({MIGRATION_LOCK_KEY});"),
    ))
    .await?;

    for file in &files {
        let sql = fs::read_to_string(file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = strip_comments(stmt);
            if stmt.is_empty() {
                continue;
            }
            txn.execute(Statement::from_string(backend, format!("{stmt};")))
                .await?;
        }
        tracing::debug!(file = %file.display(), "migration applied");
    }

    txn.commit().await?;
    Ok(files.len())
}

fn strip_comments(stmt: &str) -> String {
    stmt.lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// True for Postgres serialization failures and detected deadlocks.
pub fn is_retryable(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db)) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

/// Runs `op` again when its transaction lost a serialization race, at most
/// `limit` attempts in total. Business errors are returned as they are.
pub async fn retry_on_conflict<T, F, Fut>(limit: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(AppError::OrmError(err)) if is_retryable(&err) && attempt < limit => {
                tracing::warn!(attempt, error = %err, "transaction conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}
