mod agents;
mod db;
mod error;
mod migrations;
mod missions;

pub use agents::AgentStore;
pub use db::Database;
pub use error::{Entity, StoreError, StoreResult, Violation};
pub use missions::MissionStore;
