//! Cash balance routes: one handler per drawer operation.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(history))
        .route("/open", post(open))
        .route("/today", get(today))
        .route("/expenses", post(add_expense))
        .route("/expenses/:index", delete(remove_expense))
        .route("/close", post(close))
        .route("/reopen", patch(reopen))
}

pub async fn open(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::OpenRequest>,
) -> axum::response::Response {
    let override_balance = match body.initial_balance_override {
        Some(raw) => match dto::parse_money(raw, "initial_balance_override") {
            Ok(amount) => Some(amount),
            Err(resp) => return resp,
        },
        None => None,
    };

    match services.open_today(&caller, override_balance) {
        Ok(status) => {
            (StatusCode::CREATED, Json(dto::today_status_json(&status))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn today(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<dto::TodayQuery>,
) -> axum::response::Response {
    let counted_preview = match query.counted_cash {
        Some(raw) => match dto::parse_money(raw, "counted_cash") {
            Ok(amount) => Some(amount),
            Err(resp) => return resp,
        },
        None => None,
    };

    match services.get_today(&caller, counted_preview) {
        Ok(status) => (StatusCode::OK, Json(dto::today_status_json(&status))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::ExpenseRequest>,
) -> axum::response::Response {
    let draft = match dto::to_expense_draft(body) {
        Ok(draft) => draft,
        Err(resp) => return resp,
    };

    match services.add_expense(&caller, draft) {
        Ok(status) => (StatusCode::CREATED, Json(dto::today_status_json(&status))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(index): Path<usize>,
) -> axum::response::Response {
    match services.remove_expense(&caller, index) {
        Ok(status) => (StatusCode::OK, Json(dto::today_status_json(&status))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn close(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CloseRequest>,
) -> axum::response::Response {
    let Some(raw) = body.counted_cash_physical else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "counted_cash_physical is required",
        );
    };
    let counted_cash = match dto::parse_money(raw, "counted_cash_physical") {
        Ok(amount) => amount,
        Err(resp) => return resp,
    };

    match services.close_today(&caller, counted_cash, body.notes) {
        Ok(status) => (StatusCode::OK, Json(dto::today_status_json(&status))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reopen(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match services.reopen_today(&caller) {
        Ok(status) => (StatusCode::OK, Json(dto::today_status_json(&status))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<dto::HistoryQuery>,
) -> axum::response::Response {
    let filters = match dto::to_history_filters(&query) {
        Ok(filters) => filters,
        Err(resp) => return resp,
    };
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(dto::DEFAULT_HISTORY_LIMIT);

    match services.list_history(&caller, &filters, skip, limit) {
        Ok(rows) => {
            let items = rows.iter().map(dto::history_view_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
