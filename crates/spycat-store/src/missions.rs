use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use spycat_core::{AgentId, Mission, MissionId, NewMission, NewTarget, Target, TargetId};
use tracing::{debug, warn};

use crate::error::{Entity, StoreError, StoreResult, Violation};

const MISSION_JOIN: &str = "
    SELECT m.id, m.cat_id, m.completed,
           t.id, t.name, t.country, t.notes, t.complete
    FROM missions m
    LEFT JOIN targets t ON t.mission_id = m.id";

/// Owns missions and their targets and enforces the lifecycle rules.
///
/// Guards are never checked in one round trip and acted on in another. Either
/// the guard lives in the `WHERE` clause of the single statement that mutates
/// (assignment, notes, target completion), or the guard is re-read inside an
/// immediate transaction that holds the write lock until commit (mission
/// delete, target add, target delete). A transaction dropped before commit
/// rolls back, so an abandoned call never leaves a partial mutation behind.
pub struct MissionStore {
    conn: Connection,
}

impl MissionStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts the mission and all of its targets in one transaction. The
    /// mission always starts incomplete.
    pub fn create_mission(&mut self, mission: &NewMission) -> StoreResult<Mission> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO missions (cat_id, completed) VALUES (?1, 0)",
            params![mission.cat_id],
        )?;
        let mission_id = tx.last_insert_rowid();

        let mut targets = Vec::with_capacity(mission.targets.len());
        for target in &mission.targets {
            targets.push(insert_target(&tx, mission_id, target)?);
        }
        tx.commit()?;

        debug!(mission_id, targets = targets.len(), "mission created");
        Ok(Mission {
            id: mission_id,
            cat_id: mission.cat_id,
            completed: false,
            targets,
        })
    }

    pub fn delete_mission(&mut self, id: MissionId) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let cat_id: Option<AgentId> = tx
            .query_row(
                "SELECT cat_id FROM missions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Mission, id))?;
        if let Some(cat_id) = cat_id {
            warn!(mission_id = id, cat_id, "refusing to delete assigned mission");
            return Err(Violation::MissionAssigned.into());
        }

        let removed_targets = tx.execute("DELETE FROM targets WHERE mission_id = ?1", params![id])?;
        tx.execute("DELETE FROM missions WHERE id = ?1", params![id])?;
        tx.commit()?;

        debug!(mission_id = id, removed_targets, "mission deleted");
        Ok(())
    }

    /// Marks the mission completed. Completing an already completed mission
    /// succeeds again; target state is not consulted.
    pub fn complete_mission(&self, id: MissionId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE missions SET completed = 1 WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found(Entity::Mission, id));
        }
        debug!(mission_id = id, "mission completed");
        Ok(())
    }

    /// Binds an agent to an unassigned mission. A missing mission and an
    /// already assigned one are indistinguishable here.
    pub fn assign_agent(&self, mission_id: MissionId, agent_id: AgentId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE missions SET cat_id = ?1 WHERE id = ?2 AND cat_id IS NULL",
            params![agent_id, mission_id],
        )?;
        if changed == 0 {
            warn!(mission_id, agent_id, "assignment rejected");
            return Err(Violation::AlreadyAssignedOrMissing.into());
        }
        debug!(mission_id, agent_id, "agent assigned");
        Ok(())
    }

    pub fn add_target(&mut self, mission_id: MissionId, target: &NewTarget) -> StoreResult<Target> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let completed: bool = tx
            .query_row(
                "SELECT completed FROM missions WHERE id = ?1",
                params![mission_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Mission, mission_id))?;
        if completed {
            warn!(mission_id, "refusing to add target to completed mission");
            return Err(Violation::MissionCompleted.into());
        }

        let stored = insert_target(&tx, mission_id, target)?;
        tx.commit()?;

        debug!(mission_id, target_id = stored.id, "target added");
        Ok(stored)
    }

    pub fn update_target_notes(&self, target_id: TargetId, notes: &str) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE targets
             SET notes = ?1
             WHERE id = ?2
               AND complete = 0
               AND EXISTS (
                 SELECT 1 FROM missions m
                 WHERE m.id = targets.mission_id AND m.completed = 0
               )",
            params![notes, target_id],
        )?;
        if changed == 0 {
            warn!(target_id, "notes update rejected");
            return Err(Violation::TargetOrMissionCompleted.into());
        }
        debug!(target_id, "target notes updated");
        Ok(())
    }

    pub fn complete_target(&self, target_id: TargetId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE targets SET complete = 1 WHERE id = ?1 AND complete = 0",
            params![target_id],
        )?;
        if changed == 0 {
            warn!(target_id, "target completion rejected");
            return Err(Violation::TargetMissingOrComplete.into());
        }
        debug!(target_id, "target completed");
        Ok(())
    }

    pub fn delete_target(&mut self, target_id: TargetId) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let complete: bool = tx
            .query_row(
                "SELECT complete FROM targets WHERE id = ?1",
                params![target_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Target, target_id))?;
        if complete {
            warn!(target_id, "refusing to delete completed target");
            return Err(Violation::TargetCompleted.into());
        }

        tx.execute("DELETE FROM targets WHERE id = ?1", params![target_id])?;
        tx.commit()?;

        debug!(target_id, "target deleted");
        Ok(())
    }

    pub fn get_all(&self) -> StoreResult<Vec<Mission>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MISSION_JOIN} ORDER BY m.id ASC, t.id ASC"))?;
        let rows = stmt
            .query_map([], joined_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(group_by_mission(rows))
    }

    pub fn get_by_id(&self, id: MissionId) -> StoreResult<Mission> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MISSION_JOIN} WHERE m.id = ?1 ORDER BY t.id ASC"))?;
        let rows = stmt
            .query_map(params![id], joined_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        group_by_mission(rows)
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(Entity::Mission, id))
    }

    /// Existence read for a single target. Callers that need to tell "missing"
    /// apart from a rejected notes update or completion use this first.
    pub fn get_target(&self, target_id: TargetId) -> StoreResult<Target> {
        self.conn
            .query_row(
                "SELECT id, name, country, notes, complete FROM targets WHERE id = ?1",
                params![target_id],
                |row| {
                    Ok(Target {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        country: row.get(2)?,
                        notes: row.get(3)?,
                        complete: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Target, target_id))
    }

    pub fn count_targets(&self, mission_id: MissionId) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM targets WHERE mission_id = ?1",
            params![mission_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn insert_target(conn: &Connection, mission_id: MissionId, target: &NewTarget) -> StoreResult<Target> {
    conn.execute(
        "INSERT INTO targets (mission_id, name, country, notes, complete)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            mission_id,
            target.name,
            target.country,
            target.notes,
            target.complete
        ],
    )?;
    Ok(Target {
        id: conn.last_insert_rowid(),
        name: target.name.clone(),
        country: target.country.clone(),
        notes: target.notes.clone(),
        complete: target.complete,
    })
}

/// One row of the mission/target outer join. `target` is `None` when the
/// mission has no targets; the joined id column is NULL in that case.
struct JoinedRow {
    mission_id: MissionId,
    cat_id: Option<AgentId>,
    completed: bool,
    target: Option<Target>,
}

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<JoinedRow> {
    let target_id: Option<TargetId> = row.get(3)?;
    let target = match target_id {
        Some(id) => Some(Target {
            id,
            name: row.get(4)?,
            country: row.get(5)?,
            notes: row.get(6)?,
            complete: row.get(7)?,
        }),
        None => None,
    };
    Ok(JoinedRow {
        mission_id: row.get(0)?,
        cat_id: row.get(1)?,
        completed: row.get(2)?,
        target,
    })
}

fn group_by_mission(rows: Vec<JoinedRow>) -> Vec<Mission> {
    let mut missions: BTreeMap<MissionId, Mission> = BTreeMap::new();
    for row in rows {
        let mission = missions.entry(row.mission_id).or_insert_with(|| Mission {
            id: row.mission_id,
            cat_id: row.cat_id,
            completed: row.completed,
            targets: Vec::new(),
        });
        if let Some(target) = row.target {
            mission.targets.push(target);
        }
    }
    missions.into_values().collect()
}
