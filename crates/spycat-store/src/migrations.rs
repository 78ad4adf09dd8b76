use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::info;

const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        1,
        "agents_missions_targets",
        r#"
        CREATE TABLE IF NOT EXISTS agents (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          years_of_experience INTEGER NOT NULL,
          breed TEXT NOT NULL,
          salary REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS missions (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          cat_id INTEGER REFERENCES agents(id),
          completed INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS targets (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          mission_id INTEGER NOT NULL REFERENCES missions(id),
          name TEXT NOT NULL,
          country TEXT NOT NULL,
          notes TEXT NOT NULL DEFAULT '',
          complete INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ),
    (
        2,
        "lookup_indexes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_targets_mission_id ON targets(mission_id);
        CREATE INDEX IF NOT EXISTS idx_missions_cat_id ON missions(cat_id)
          WHERE cat_id IS NOT NULL;
        "#,
    ),
];

pub(crate) fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
          version INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )?;

    for (version, name, sql) in MIGRATIONS {
        apply_migration(conn, *version, name, sql)
            .with_context(|| format!("migration {version} ({name}) failed"))?;
    }
    Ok(())
}

fn apply_migration(conn: &mut Connection, version: i64, name: &str, sql: &str) -> Result<()> {
    // Immediate so two processes opening a fresh file do not race on the same version.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let applied = tx
        .query_row(
            "SELECT 1 FROM schema_migrations WHERE version = ?1",
            params![version],
            |_| Ok(()),
        )
        .optional()?;
    if applied.is_some() {
        return Ok(());
    }

    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
        params![version, name],
    )?;
    tx.commit()?;
    info!(version, name, "applied schema migration");
    Ok(())
}

pub(crate) fn current_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}
