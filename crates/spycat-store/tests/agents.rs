use std::time::Duration;

use spycat_core::{NewAgent, NewMission};
use spycat_store::{Database, Entity, StoreError};
use tempfile::tempdir;

#[test]
fn agent_crud_roundtrip() {
    let tmp = tempdir().expect("tempdir");
    let db = Database::open(&tmp.path().join("spycat.db"), Duration::from_millis(500))
        .expect("open database");
    let agents = db.agents().expect("agent store");

    let tom = agents
        .create(&NewAgent::new("Tom", 4, "Siamese", 1_000.0))
        .expect("create tom");
    let kit = agents
        .create(&NewAgent::new("Kit", 1, "Bengal", 650.5))
        .expect("create kit");
    assert_ne!(tom.id, kit.id);

    let all = agents.get_all().expect("list agents");
    assert_eq!(all, vec![tom.clone(), kit.clone()]);

    agents.update_salary(kit.id, 800.0).expect("raise");
    assert_eq!(agents.get_by_id(kit.id).expect("load kit").salary, 800.0);

    agents.delete(tom.id).expect("delete tom");
    assert_eq!(agents.get_all().expect("list agents").len(), 1);
}

#[test]
fn missing_agent_reports_not_found_from_row_count() {
    let tmp = tempdir().expect("tempdir");
    let db = Database::open(&tmp.path().join("spycat.db"), Duration::from_millis(500))
        .expect("open database");
    let agents = db.agents().expect("agent store");

    for err in [
        agents.get_by_id(7).expect_err("lookup"),
        agents.update_salary(7, 1.0).expect_err("update"),
        agents.delete(7).expect_err("delete"),
    ] {
        assert!(matches!(
            err,
            StoreError::NotFound {
                entity: Entity::Agent,
                id: 7
            }
        ));
    }
}

#[test]
fn agent_bound_to_a_mission_cannot_be_deleted() {
    let tmp = tempdir().expect("tempdir");
    let db = Database::open(&tmp.path().join("spycat.db"), Duration::from_millis(500))
        .expect("open database");
    let agents = db.agents().expect("agent store");
    let mut missions = db.missions().expect("mission store");

    let tom = agents
        .create(&NewAgent::new("Tom", 4, "Siamese", 1_000.0))
        .expect("create tom");
    let mission = missions
        .create_mission(&NewMission::default())
        .expect("create mission");
    missions.assign_agent(mission.id, tom.id).expect("assign");

    let err = agents.delete(tom.id).expect_err("referenced by mission");
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(!err.is_retryable());
    assert_eq!(
        missions.get_by_id(mission.id).expect("mission").cat_id,
        Some(tom.id)
    );
}
