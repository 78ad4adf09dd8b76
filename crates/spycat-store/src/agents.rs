use rusqlite::{Connection, OptionalExtension, Row, params};
use spycat_core::{Agent, AgentId, NewAgent};
use tracing::debug;

use crate::error::{Entity, StoreError, StoreResult};

const AGENT_COLUMNS: &str = "id, name, years_of_experience, breed, salary";

/// Single-row CRUD over cats. Update and delete report `NotFound` from the
/// affected-row count rather than a prior read.
pub struct AgentStore {
    conn: Connection,
}

impl AgentStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, agent: &NewAgent) -> StoreResult<Agent> {
        self.conn.execute(
            "INSERT INTO agents (name, years_of_experience, breed, salary)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                agent.name,
                agent.years_of_experience,
                agent.breed,
                agent.salary
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(agent_id = id, breed = %agent.breed, "agent created");
        Ok(Agent {
            id,
            name: agent.name.clone(),
            years_of_experience: agent.years_of_experience,
            breed: agent.breed.clone(),
            salary: agent.salary,
        })
    }

    pub fn get_all(&self) -> StoreResult<Vec<Agent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY id ASC"))?;
        let rows = stmt.query_map([], agent_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_by_id(&self, id: AgentId) -> StoreResult<Agent> {
        self.conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
                params![id],
                agent_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Agent, id))
    }

    pub fn update_salary(&self, id: AgentId, salary: f64) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE agents SET salary = ?1 WHERE id = ?2",
            params![salary, id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Entity::Agent, id));
        }
        debug!(agent_id = id, salary, "agent salary updated");
        Ok(())
    }

    pub fn delete(&self, id: AgentId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::not_found(Entity::Agent, id));
        }
        debug!(agent_id = id, "agent deleted");
        Ok(())
    }
}

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        years_of_experience: row.get(2)?,
        breed: row.get(3)?,
        salary: row.get(4)?,
    })
}
