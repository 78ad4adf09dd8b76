mod breeds;
mod ids;
mod model;

pub use breeds::{BreedCatalog, StaticBreedCatalog};
pub use ids::{IdParseError, parse_id};
pub use model::{
    Agent, AgentId, Mission, MissionId, MissionState, NewAgent, NewMission, NewTarget, Target,
    TargetId, ValidationError, validate_salary,
};
