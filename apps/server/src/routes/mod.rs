use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};

use crate::error::ErrorBody;

mod config;
mod health;
mod ping;
mod results;

#[cfg(test)]
mod test_support;

/// Register every route plus JSON error bodies for extractor failures
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(query_config());

    health::routes(cfg);
    config::routes(cfg);
    ping::routes(cfg);
    results::routes(cfg);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorBody::new(format!("invalid request body: {err}"));
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = ErrorBody::new(format!("invalid query string: {err}"));
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}
