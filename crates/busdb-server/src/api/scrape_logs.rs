use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeLogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeLogItem {
    scrape_log_id: Uuid,
    route_url: String,
    status: String,
    buses_scraped: i32,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

pub(super) async fn list_scrape_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeLogsQuery>,
) -> Result<Json<ApiResponse<Vec<ScrapeLogItem>>>, ApiError> {
    let rows = busdb_db::list_scrape_logs(&state.pool, normalize_limit(query.limit, 50, 200))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ScrapeLogItem {
            scrape_log_id: row.public_id,
            route_url: row.route_url,
            status: row.status,
            buses_scraped: row.buses_scraped,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::ScrapeLogItem;
    use crate::api::test_support::get_json;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn scrape_log_item_is_serializable() {
        let item = ScrapeLogItem {
            scrape_log_id: Uuid::new_v4(),
            route_url: "https://www.redbus.in/bus-tickets/kochi-to-trivandrum".to_string(),
            status: "FAILED".to_string(),
            buses_scraped: 0,
            error_message: Some("no bus listings found".to_string()),
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };

        let json = serde_json::to_string(&item).expect("serialize scrape log");
        assert!(json.contains("\"status\":\"FAILED\""));
        assert!(json.contains("\"buses_scraped\":0"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn lists_recent_logs_up_to_limit(pool: sqlx::PgPool) {
        let first = busdb_db::create_scrape_log(&pool, "https://a.test/")
            .await
            .expect("create");
        busdb_db::complete_scrape_log(&pool, first.id, 5)
            .await
            .expect("complete");
        busdb_db::create_scrape_log(&pool, "https://b.test/")
            .await
            .expect("create");

        let (status, json) = get_json(pool, "/api/v1/scrape-logs?limit=1").await;

        assert_eq!(status, StatusCode::OK);
        let logs = json["data"].as_array().expect("data array");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["route_url"], "https://b.test/");
        assert_eq!(logs[0]["status"], "STARTED");
    }
}
