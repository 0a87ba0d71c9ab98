/// Family member and health record endpoints (owner only)
use crate::{
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
    family::{
        parse_member_id, CreateFamilyMemberRequest, FamilyMember, ListFamilyMembersResponse,
        UpdateFamilyMemberRequest,
    },
    health::{
        CreateHealthRecordRequest, HealthRecord, ListHealthRecordsResponse,
        UpdateHealthRecordRequest,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

/// Build family routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/family", get(list_family_members).post(add_family_member))
        .route(
            "/family/:id",
            get(get_family_member)
                .put(update_family_member)
                .delete(delete_family_member),
        )
        .route(
            "/family/:id/records",
            get(list_health_records).post(add_health_record),
        )
        .route(
            "/family/:id/records/:record_id",
            get(get_health_record)
                .put(update_health_record)
                .delete(delete_health_record),
        )
}

async fn add_family_member(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateFamilyMemberRequest>,
) -> ApiResult<(StatusCode, Json<FamilyMember>)> {
    let member = ctx.family_manager.create_member(&auth.owner_id, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn list_family_members(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<ListFamilyMembersResponse>> {
    let members = ctx.family_manager.list_members(&auth.owner_id).await?;
    Ok(Json(ListFamilyMembersResponse { members }))
}

async fn get_family_member(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<FamilyMember>> {
    let id = parse_member_id(&id)?;
    let member = ctx.family_manager.get_owned_member(&auth.owner_id, &id).await?;
    Ok(Json(member))
}

async fn update_family_member(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateFamilyMemberRequest>,
) -> ApiResult<Json<FamilyMember>> {
    let id = parse_member_id(&id)?;
    let member = ctx
        .family_manager
        .update_member(&auth.owner_id, &id, req)
        .await?;
    Ok(Json(member))
}

async fn delete_family_member(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_member_id(&id)?;
    ctx.family_manager.delete_member(&auth.owner_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_health_record(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<CreateHealthRecordRequest>,
) -> ApiResult<(StatusCode, Json<HealthRecord>)> {
    let id = parse_member_id(&id)?;
    let member = ctx.family_manager.get_owned_member(&auth.owner_id, &id).await?;
    let record = ctx.health_manager.create_record(&member.id, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_health_records(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ListHealthRecordsResponse>> {
    let id = parse_member_id(&id)?;
    let member = ctx.family_manager.get_owned_member(&auth.owner_id, &id).await?;
    let health_records = ctx.health_manager.list_for_member(&member.id).await?;
    Ok(Json(ListHealthRecordsResponse { health_records }))
}

async fn get_health_record(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((id, record_id)): Path<(String, String)>,
) -> ApiResult<Json<HealthRecord>> {
    let id = parse_member_id(&id)?;
    let member = ctx.family_manager.get_owned_member(&auth.owner_id, &id).await?;
    let record = ctx.health_manager.get_record(&member.id, &record_id).await?;
    Ok(Json(record))
}

async fn update_health_record(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((id, record_id)): Path<(String, String)>,
    Json(req): Json<UpdateHealthRecordRequest>,
) -> ApiResult<Json<HealthRecord>> {
    let id = parse_member_id(&id)?;
    let member = ctx.family_manager.get_owned_member(&auth.owner_id, &id).await?;
    let record = ctx
        .health_manager
        .update_record(&member.id, &record_id, req)
        .await?;
    Ok(Json(record))
}

async fn delete_health_record(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((id, record_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let id = parse_member_id(&id)?;
    let member = ctx.family_manager.get_owned_member(&auth.owner_id, &id).await?;
    ctx.health_manager.delete_record(&member.id, &record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
