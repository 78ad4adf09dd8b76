use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use spycat_core::{NewAgent, parse_id, validate_salary};
use tracing::info;

use crate::AppState;
use crate::dto::{AgentDto, CreateAgentInput, MessageDto, SalaryInput};
use crate::error::{ApiError, ApiResult};

pub(crate) async fn create_cat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAgentInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AgentDto>)> {
    let Json(input) = payload?;
    let agent = NewAgent::from(input);
    agent.validate()?;
    if !state.breeds.is_valid_breed(&agent.breed) {
        return Err(ApiError::bad_request(format!(
            "invalid breed: {}",
            agent.breed
        )));
    }

    let created = state.run(move |db| db.agents()?.create(&agent)).await?;
    info!(agent_id = created.id, "cat enrolled");
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub(crate) async fn list_cats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<AgentDto>>> {
    let agents = state.run(|db| db.agents()?.get_all()).await?;
    Ok(Json(agents.into_iter().map(AgentDto::from).collect()))
}

pub(crate) async fn get_cat(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<AgentDto>> {
    let id = parse_id(&raw_id)?;
    let agent = state.run(move |db| db.agents()?.get_by_id(id)).await?;
    Ok(Json(agent.into()))
}

pub(crate) async fn update_salary(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<SalaryInput>, JsonRejection>,
) -> ApiResult<Json<MessageDto>> {
    let id = parse_id(&raw_id)?;
    let Json(input) = payload?;
    validate_salary(input.salary)?;
    state
        .run(move |db| db.agents()?.update_salary(id, input.salary))
        .await?;
    Ok(Json(MessageDto::new("salary updated")))
}

pub(crate) async fn delete_cat(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageDto>> {
    let id = parse_id(&raw_id)?;
    state.run(move |db| db.agents()?.delete(id)).await?;
    Ok(Json(MessageDto::new("cat deleted")))
}
