use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::error::TransferError;
use crate::models::Actor;
use crate::workflow::{InitiateTransfer, TransferDecision};

#[derive(Deserialize)]
pub struct InitiateBody {
    #[serde(flatten)]
    pub transfer: InitiateTransfer,
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct DecisionBody {
    pub decision: TransferDecision,
    pub actor: Actor,
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CompleteBody {
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct TransferQuery {
    pub family_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AttentionQuery {
    pub office_id: String,
}

pub async fn initiate_transfer(
    state: web::Data<AppState>,
    body: web::Json<InitiateBody>,
) -> Result<HttpResponse, TransferError> {
    let body = body.into_inner();
    let outcome = state.workflow.initiate(body.transfer, body.actor).await?;
    Ok(HttpResponse::Created().json(outcome))
}

pub async fn decide_transfer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<DecisionBody>,
) -> Result<HttpResponse, TransferError> {
    let body = body.into_inner();
    state
        .workflow
        .decide(&id, body.decision, body.actor, body.rejection_reason)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

pub async fn complete_transfer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<CompleteBody>,
) -> Result<HttpResponse, TransferError> {
    state.workflow.complete(&id, body.into_inner().actor).await?;
    // complete() always errors today; this arm is for when the
    // receiving-office collaborator lands.
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

pub async fn get_transfer(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, TransferError> {
    let history = state.workflow.transfer(&id).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn list_transfers(
    state: web::Data<AppState>,
    query: web::Query<TransferQuery>,
) -> Result<HttpResponse, TransferError> {
    let transfers = state
        .workflow
        .list_transfers(query.family_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(transfers))
}

pub async fn get_slip(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, TransferError> {
    let slip = state.workflow.slip(&id).await?;
    Ok(HttpResponse::Ok().json(slip))
}

pub async fn awaiting_destination(
    state: web::Data<AppState>,
    query: web::Query<AttentionQuery>,
) -> Result<HttpResponse, TransferError> {
    let transfers = state
        .workflow
        .awaiting_destination(&query.office_id)
        .await?;
    Ok(HttpResponse::Ok().json(transfers))
}

pub async fn list_offices(state: web::Data<AppState>) -> Result<HttpResponse, TransferError> {
    let offices = state.directory.list().await?;
    Ok(HttpResponse::Ok().json(offices))
}
