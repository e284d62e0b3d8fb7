use actix_web::{HttpResponse, get, post, web};
use hostping_service::SchedulerState;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route start_ping,
    route stop_ping,
    route ping_status,
}

#[derive(Debug, Serialize)]
struct ControlResponse {
    message: &'static str,
    state: SchedulerState,
}

/// Start probing with the current configuration
#[post("/api/ping/start")]
pub async fn start_ping(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    state.scheduler.start_current().await?;
    Ok(HttpResponse::Ok().json(ControlResponse {
        message: "Ping started",
        state: state.scheduler.state(),
    }))
}

/// Stop probing; the in-flight probe still completes and is recorded
#[post("/api/ping/stop")]
pub async fn stop_ping(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    state.scheduler.stop().await?;
    Ok(HttpResponse::Ok().json(ControlResponse {
        message: "Ping stopped",
        state: state.scheduler.state(),
    }))
}

#[get("/api/ping/status")]
pub async fn ping_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.scheduler.status().await)
}
