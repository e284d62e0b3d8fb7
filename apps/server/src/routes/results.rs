use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use hostping_service::ProbeOutcome;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route get_results,
}

/// `GET /api/results` parameters; instants are RFC 3339
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub host: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ResultsResponse {
    count: usize,
    /// Older outcomes were dropped to honour the limit
    truncated: bool,
    outcomes: Vec<ProbeOutcome>,
}

/// Recorded outcomes, oldest first. When more than `limit` match, the most
/// recent `limit` are returned.
#[get("/api/results")]
pub async fn get_results(
    state: web::Data<AppState>,
    query: web::Query<ResultsQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let from = query.from.unwrap_or(DateTime::UNIX_EPOCH);
    let to = query.to.unwrap_or_else(Utc::now);
    if from > to {
        return Err(ApiError::BadRequest("`from` is after `to`".into()));
    }

    let host = query.host.as_deref().filter(|h| !h.is_empty());
    let limit = query.limit.unwrap_or(state.max_query_results).min(state.max_query_results);

    // One extra row tells whether anything older was left out
    let mut outcomes = state.store.query_latest(host, from, to, limit.saturating_add(1)).await?;
    let truncated = outcomes.len() > limit;
    if truncated {
        outcomes.remove(0);
    }

    Ok(HttpResponse::Ok().json(ResultsResponse { count: outcomes.len(), truncated, outcomes }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::{DateTime, Utc};
    use hostping_service::{ProbeErrorKind, ProbeOutcome, ResultStore};
    use serde_json::Value;

    use crate::routes::routes;
    use crate::routes::test_support::{TestContext, test_state};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    async fn seeded(max_query_results: usize) -> TestContext {
        let ctx = test_state(max_query_results);
        for i in 0..10 {
            ctx.store
                .append(&ProbeOutcome::success(at(i), "8.8.8.8", Duration::from_millis(4)))
                .await
                .unwrap();
            ctx.store
                .append(&ProbeOutcome::failure(at(i), "1.1.1.1", ProbeErrorKind::Unreachable, "host unreachable"))
                .await
                .unwrap();
        }
        ctx
    }

    #[actix_web::test]
    async fn test_filter_by_host_and_range() {
        let ctx = seeded(100).await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(routes)).await;

        let uri = format!(
            "/api/results?host=8.8.8.8&from={}&to={}",
            at(2).to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            at(5).to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        );
        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["count"], 4);
        assert_eq!(body["truncated"], false);
        let outcomes = body["outcomes"].as_array().unwrap();
        assert!(outcomes.iter().all(|o| o["host"] == "8.8.8.8"));
        assert_eq!(outcomes[0]["timestamp"], "2023-11-14T22:13:22Z");
        assert_eq!(outcomes[0]["latency_ms"], 4.0);
    }

    #[actix_web::test]
    async fn test_limit_keeps_newest() {
        let ctx = seeded(3).await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/results?host=1.1.1.1&limit=50").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["count"], 3);
        assert_eq!(body["truncated"], true);
        let outcomes = body["outcomes"].as_array().unwrap();
        assert_eq!(outcomes[0]["error_kind"], "unreachable");
        assert_eq!(outcomes[2]["timestamp"], "2023-11-14T22:13:29Z");
    }

    #[actix_web::test]
    async fn test_bad_range() {
        let ctx = seeded(100).await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/results?from=yesterday").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/results?from=2024-01-02T00:00:00Z&to=2024-01-01T00:00:00Z")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
