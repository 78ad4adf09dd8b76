use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use spycat_core::{NewMission, NewTarget, parse_id};

use crate::AppState;
use crate::dto::{
    AssignInput, CreateMissionInput, MessageDto, MissionDto, NotesInput, TargetDto, TargetInput,
};
use crate::error::{ApiError, ApiResult};

pub(crate) async fn create_mission(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateMissionInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MissionDto>)> {
    let Json(input) = payload?;
    if input.cat_id.is_some_and(|id| id < 0) {
        return Err(ApiError::bad_request("cat_id cannot be negative"));
    }
    let mission = NewMission::from(input);
    let created = state
        .run(move |db| db.missions()?.create_mission(&mission))
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub(crate) async fn list_missions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MissionDto>>> {
    let missions = state.run(|db| db.missions()?.get_all()).await?;
    Ok(Json(missions.into_iter().map(MissionDto::from).collect()))
}

pub(crate) async fn get_mission(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MissionDto>> {
    let id = parse_id(&raw_id)?;
    let mission = state.run(move |db| db.missions()?.get_by_id(id)).await?;
    Ok(Json(mission.into()))
}

pub(crate) async fn delete_mission(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageDto>> {
    let id = parse_id(&raw_id)?;
    state
        .run(move |db| db.missions()?.delete_mission(id))
        .await?;
    Ok(Json(MessageDto::new("mission deleted")))
}

pub(crate) async fn complete_mission(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageDto>> {
    let id = parse_id(&raw_id)?;
    state
        .run(move |db| db.missions()?.complete_mission(id))
        .await?;
    Ok(Json(MessageDto::new("mission marked as complete")))
}

pub(crate) async fn assign_cat(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<AssignInput>, JsonRejection>,
) -> ApiResult<Json<MessageDto>> {
    let mission_id = parse_id(&raw_id)?;
    let Json(input) = payload?;
    if input.cat_id < 0 {
        return Err(ApiError::bad_request("cat_id cannot be negative"));
    }
    state
        .run(move |db| db.missions()?.assign_agent(mission_id, input.cat_id))
        .await?;
    Ok(Json(MessageDto::new("cat assigned to mission")))
}

pub(crate) async fn add_target(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<TargetInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TargetDto>)> {
    let mission_id = parse_id(&raw_id)?;
    let Json(input) = payload?;
    let target = NewTarget::from(input);
    let stored = state
        .run(move |db| db.missions()?.add_target(mission_id, &target))
        .await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

pub(crate) async fn update_target_notes(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<NotesInput>, JsonRejection>,
) -> ApiResult<Json<MessageDto>> {
    let target_id = parse_id(&raw_id)?;
    let Json(input) = payload?;
    state
        .run(move |db| db.missions()?.update_target_notes(target_id, &input.notes))
        .await?;
    Ok(Json(MessageDto::new("notes updated")))
}

pub(crate) async fn complete_target(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageDto>> {
    let target_id = parse_id(&raw_id)?;
    state
        .run(move |db| db.missions()?.complete_target(target_id))
        .await?;
    Ok(Json(MessageDto::new("target marked as complete")))
}

pub(crate) async fn delete_target(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageDto>> {
    let target_id = parse_id(&raw_id)?;
    state
        .run(move |db| db.missions()?.delete_target(target_id))
        .await?;
    Ok(Json(MessageDto::new("target deleted")))
}
