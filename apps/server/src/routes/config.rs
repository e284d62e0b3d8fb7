use actix_web::{HttpResponse, get, post, web};
use hostping_service::{ConfigDocument, ConfigPayload};

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route get_config,
    route update_config,
}

/// Current probe configuration
#[get("/api/config")]
pub async fn get_config(state: web::Data<AppState>) -> HttpResponse {
    let config = state.scheduler.config();
    HttpResponse::Ok().json(ConfigDocument::from(config.as_ref()))
}

/// Validate, persist and apply a new probe configuration.
/// A running probe loop picks it up on its next cycle.
#[post("/api/config")]
pub async fn update_config(
    state: web::Data<AppState>,
    payload: web::Json<ConfigPayload>,
) -> Result<HttpResponse, ApiError> {
    let config = payload.into_inner().into_config()?;

    let _guard = state.config_lock.lock().await;
    state.provider.save(&config)?;
    state.scheduler.reconfigure(config.clone());

    Ok(HttpResponse::Ok().json(ConfigDocument::from(&config)))
}
