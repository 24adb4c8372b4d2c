//! Attribute handlers
//!
//! `POST /jsonrpc` serves the `AttributeSv1` methods the way CGRateS
//! clients call them. The same operations are exposed as plain JSON
//! endpoints under `/api/v1/attributes`.

use crate::dto::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, SERVER_ERROR};
use actix_web::{web, HttpResponse};
use apolo_attributes::AttributeService;
use apolo_core::models::CgrEvent;
use apolo_core::AppError;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

pub const ATTRIBUTE_SV1_PING: &str = "AttributeSv1.Ping";
pub const ATTRIBUTE_SV1_PROCESS_EVENT: &str = "AttributeSv1.ProcessEvent";
pub const ATTRIBUTE_SV1_GET_ATTRIBUTE_FOR_EVENT: &str = "AttributeSv1.GetAttributeForEvent";

/// Configure attribute routes
///
/// Register inside the `/api/v1` scope. `/jsonrpc` goes through
/// [`configure_jsonrpc`] at the root.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attributes")
            .route("/process", web::post().to(process_event))
            .route("/profile", web::post().to(get_attribute_for_event)),
    );
}

/// Configure the JSON-RPC endpoint
pub fn configure_jsonrpc(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/jsonrpc")
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::Ok().json(JsonRpcResponse::failure(
                        Value::Null,
                        None,
                        JsonRpcError::parse_error(error_message),
                    )),
                )
                .into()
            }))
            .route(web::post().to(jsonrpc)),
    );
}

// ============================================================================
// JSON-RPC
// ============================================================================

/// JSON-RPC entry point
///
/// POST /jsonrpc
///
/// Always answers 200; failures travel in the `error` member.
#[instrument(skip(svc, req), fields(method = %req.method))]
pub async fn jsonrpc(
    svc: web::Data<AttributeService>,
    req: web::Json<JsonRpcRequest>,
) -> HttpResponse {
    let req = req.into_inner();
    let result = dispatch(svc.get_ref(), &req).await;

    if let Err(e) = &result {
        if e.code == SERVER_ERROR && e.message != AppError::NotFound.to_string() {
            warn!(code = e.code, error = %e.message, "JSON-RPC call failed");
        } else {
            debug!(code = e.code, error = %e.message, "JSON-RPC call without result");
        }
    }

    HttpResponse::Ok().json(JsonRpcResponse::from_result(req.id, req.jsonrpc, result))
}

async fn dispatch(svc: &AttributeService, req: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    match req.method.as_str() {
        ATTRIBUTE_SV1_PING => Ok(json!("Pong")),
        ATTRIBUTE_SV1_PROCESS_EVENT => {
            let event = event_param(req)?;
            let reply = svc.process_event(&event).await?;
            Ok(serde_json::to_value(reply).map_err(AppError::from)?)
        }
        ATTRIBUTE_SV1_GET_ATTRIBUTE_FOR_EVENT => {
            let event = event_param(req)?;
            let profile = svc.get_attribute_for_event(&event).await?;
            Ok(serde_json::to_value(profile).map_err(AppError::from)?)
        }
        other => Err(JsonRpcError::method_not_found(other)),
    }
}

/// Decode the `CGREvent` argument
fn event_param(req: &JsonRpcRequest) -> Result<CgrEvent, JsonRpcError> {
    let raw = req
        .first_param()
        .ok_or_else(|| AppError::mandatory("CGREvent"))?;
    serde_json::from_value(raw.clone()).map_err(JsonRpcError::invalid_params)
}

// ============================================================================
// Plain JSON
// ============================================================================

/// Process an event
///
/// POST /api/v1/attributes/process
#[instrument(skip(svc, event), fields(tenant = %event.tenant))]
pub async fn process_event(
    svc: web::Data<AttributeService>,
    event: web::Json<CgrEvent>,
) -> Result<HttpResponse, AppError> {
    let reply = svc.process_event(&event).await?;
    Ok(HttpResponse::Ok().json(reply))
}

/// Preview the profile that would apply to an event
///
/// POST /api/v1/attributes/profile
#[instrument(skip(svc, event), fields(tenant = %event.tenant))]
pub async fn get_attribute_for_event(
    svc: web::Data<AttributeService>,
    event: web::Json<CgrEvent>,
) -> Result<HttpResponse, AppError> {
    let profile = svc.get_attribute_for_event(&event).await?;
    Ok(HttpResponse::Ok().json(profile))
}
