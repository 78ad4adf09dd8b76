use serde::{Deserialize, Serialize};
use spycat_core::{Agent, Mission, NewAgent, NewMission, NewTarget, Target};

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgentDto {
    pub id: i64,
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    pub salary: f64,
}

impl From<Agent> for AgentDto {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            years_of_experience: agent.years_of_experience,
            breed: agent.breed,
            salary: agent.salary,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentInput {
    pub name: String,
    #[serde(alias = "experience_in_years")]
    pub years_of_experience: i64,
    pub breed: String,
    pub salary: f64,
}

impl From<CreateAgentInput> for NewAgent {
    fn from(input: CreateAgentInput) -> Self {
        NewAgent::new(
            input.name.trim(),
            input.years_of_experience,
            input.breed.trim(),
            input.salary,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SalaryInput {
    pub salary: f64,
}

#[derive(Debug, Serialize)]
pub struct TargetDto {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub notes: String,
    pub complete: bool,
}

impl From<Target> for TargetDto {
    fn from(target: Target) -> Self {
        Self {
            id: target.id,
            name: target.name,
            country: target.country,
            notes: target.notes,
            complete: target.complete,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MissionDto {
    pub id: i64,
    pub cat_id: Option<i64>,
    pub completed: bool,
    pub targets: Vec<TargetDto>,
}

impl From<Mission> for MissionDto {
    fn from(mission: Mission) -> Self {
        Self {
            id: mission.id,
            cat_id: mission.cat_id,
            completed: mission.completed,
            targets: mission.targets.into_iter().map(TargetDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TargetInput {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub complete: bool,
}

impl From<TargetInput> for NewTarget {
    fn from(input: TargetInput) -> Self {
        NewTarget {
            name: input.name,
            country: input.country,
            notes: input.notes,
            complete: input.complete,
        }
    }
}

/// A client-supplied `completed` flag is accepted on the wire and ignored.
#[derive(Debug, Deserialize)]
pub struct CreateMissionInput {
    #[serde(default)]
    pub cat_id: Option<i64>,
    #[serde(default)]
    pub targets: Vec<TargetInput>,
}

impl From<CreateMissionInput> for NewMission {
    fn from(input: CreateMissionInput) -> Self {
        NewMission {
            cat_id: input.cat_id,
            targets: input.targets.into_iter().map(NewTarget::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignInput {
    pub cat_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct NotesInput {
    pub notes: String,
}
