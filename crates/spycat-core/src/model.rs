use thiserror::Error;

pub type AgentId = i64;
pub type MissionId = i64;
pub type TargetId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    pub salary: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAgent {
    pub name: String,
    pub years_of_experience: i64,
    pub breed: String,
    pub salary: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Blank(&'static str),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

impl NewAgent {
    pub fn new(
        name: impl Into<String>,
        years_of_experience: i64,
        breed: impl Into<String>,
        salary: f64,
    ) -> Self {
        Self {
            name: name.into(),
            years_of_experience,
            breed: breed.into(),
            salary,
        }
    }

    /// Shape checks only; breed existence is the catalog's call.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Blank("name"));
        }
        if self.breed.trim().is_empty() {
            return Err(ValidationError::Blank("breed"));
        }
        if self.years_of_experience < 0 {
            return Err(ValidationError::Negative("years_of_experience"));
        }
        validate_salary(self.salary)
    }
}

pub fn validate_salary(salary: f64) -> Result<(), ValidationError> {
    if !salary.is_finite() {
        return Err(ValidationError::NotFinite("salary"));
    }
    if salary < 0.0 {
        return Err(ValidationError::Negative("salary"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub country: String,
    pub notes: String,
    pub complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTarget {
    pub name: String,
    pub country: String,
    pub notes: String,
    pub complete: bool,
}

impl NewTarget {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            notes: String::new(),
            complete: false,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn completed(mut self) -> Self {
        self.complete = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMission {
    pub cat_id: Option<AgentId>,
    pub targets: Vec<NewTarget>,
}

impl NewMission {
    pub fn unassigned(targets: Vec<NewTarget>) -> Self {
        Self {
            cat_id: None,
            targets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub id: MissionId,
    pub cat_id: Option<AgentId>,
    pub completed: bool,
    pub targets: Vec<Target>,
}

/// Assignment axis of the mission lifecycle. Completion is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionState {
    Unassigned,
    Assigned(AgentId),
}

impl Mission {
    pub fn state(&self) -> MissionState {
        match self.cat_id {
            Some(cat_id) => MissionState::Assigned(cat_id),
            None => MissionState::Unassigned,
        }
    }

    pub fn target(&self, target_id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == target_id)
    }

    pub fn open_targets(&self) -> usize {
        self.targets.iter().filter(|t| !t.complete).count()
    }
}
