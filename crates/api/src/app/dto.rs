//! Request/response DTOs and JSON mapping helpers.
//!
//! Monetary amounts cross the wire as JSON numbers; every inbound amount is
//! funnelled through `Money::from_f64`, which rejects NaN/infinity, before
//! any domain code sees it.

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use cuadre_core::BusinessDate;
use cuadre_drawer::{
    ClosingSnapshot, DifferenceLabel, DrawerStatus, ExpenseDraft, ExpenseEntry, ExpenseLedger,
    ExpensePaymentMethod, LiveTotals, Operator,
};
use cuadre_infra::{CashRecordView, HistoryFilters};
use cuadre_money::Money;
use cuadre_sales::DailySalesAggregate;

use crate::app::errors;
use crate::app::services::TodayStatus;

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub initial_balance_override: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub concept: String,
    pub value: f64,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub expense_date: Option<BusinessDate>,
    #[serde(default)]
    pub payment_method: Option<ExpensePaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct CloseRequest {
    /// Required; kept optional in the DTO so a missing field maps to a 400
    /// with a message instead of a bare deserialization error.
    #[serde(default)]
    pub counted_cash_physical: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TodayQuery {
    #[serde(default)]
    pub counted_cash: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<BusinessDate>,
    #[serde(default)]
    pub end_date: Option<BusinessDate>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 31;

/// Parse a wire amount into `Money`, rejecting non-finite values.
pub fn parse_money(
    value: f64,
    field: &'static str,
) -> Result<Money, axum::response::Response> {
    Money::from_f64(value).ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{field} must be a finite number"),
        )
    })
}

pub fn to_history_filters(query: &HistoryQuery) -> Result<HistoryFilters, axum::response::Response> {
    let status = match &query.status {
        Some(raw) => Some(raw.parse::<DrawerStatus>().map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "status must be 'open' or 'closed'",
            )
        })?),
        None => None,
    };

    Ok(HistoryFilters {
        status,
        start_date: query.start_date,
        end_date: query.end_date,
    })
}

pub fn to_expense_draft(body: ExpenseRequest) -> Result<ExpenseDraft, axum::response::Response> {
    let value = parse_money(body.value, "value")?;

    Ok(ExpenseDraft {
        concept: body.concept,
        value,
        recipient_id: body.recipient_id,
        expense_date: body.expense_date,
        payment_method: body.payment_method.unwrap_or(ExpensePaymentMethod::Cash),
    })
}

fn money_json(amount: Money) -> JsonValue {
    json!(amount.to_f64())
}

fn operator_json(operator: &Operator) -> JsonValue {
    json!({
        "user_id": operator.user_id.to_string(),
        "username": operator.username,
    })
}

fn expense_json(entry: &ExpenseEntry) -> JsonValue {
    json!({
        "concept": entry.concept,
        "value": entry.value.to_f64(),
        "recipient_id": entry.recipient_id,
        "expense_date": entry.expense_date.to_string(),
        "payment_method": entry.payment_method,
    })
}

fn expenses_json(ledger: &ExpenseLedger) -> JsonValue {
    JsonValue::Array(ledger.entries().iter().map(expense_json).collect())
}

fn sales_json(sales: &DailySalesAggregate) -> JsonValue {
    json!({
        "cash": sales.cash.to_f64(),
        "card": sales.card.to_f64(),
        "transfer": sales.transfer.to_f64(),
        "total": sales.total.to_f64(),
        "count": sales.sales.len(),
    })
}

fn live_json(live: &LiveTotals) -> JsonValue {
    json!({
        "total_income": live.total_income.to_f64(),
        "total_expenses": live.total_expenses.to_f64(),
        "cash_expenses": live.cash_expenses.to_f64(),
        "profit": live.profit.to_f64(),
        "expected_cash": live.expected_cash.to_f64(),
        "difference": live.difference.map(Money::to_f64),
        "difference_label": live.difference.map(|d| DifferenceLabel::for_amount(d).as_str()),
        "cash_to_consign": live.cash_to_consign.to_f64(),
    })
}

fn snapshot_json(snapshot: &ClosingSnapshot) -> JsonValue {
    json!({
        "cash_sales": snapshot.cash_sales.to_f64(),
        "card_sales": snapshot.card_sales.to_f64(),
        "transfer_sales": snapshot.transfer_sales.to_f64(),
        "total_income": snapshot.total_income.to_f64(),
        "total_expenses": snapshot.total_expenses.to_f64(),
        "cash_expenses": snapshot.cash_expenses.to_f64(),
        "profit": snapshot.profit.to_f64(),
        "expected_cash": snapshot.expected_cash.to_f64(),
        "counted_cash": snapshot.counted_cash.to_f64(),
        "difference": snapshot.difference.to_f64(),
        "difference_label": snapshot.difference_label().as_str(),
        "cash_to_consign": snapshot.cash_to_consign.to_f64(),
        "notes": snapshot.notes,
        "closing_time": snapshot.closing_time.to_rfc3339(),
        "expenses_details": snapshot.expenses_details.iter().map(expense_json).collect::<Vec<_>>(),
    })
}

pub fn today_status_json(status: &TodayStatus) -> JsonValue {
    json!({
        "record_id": status.record_id.to_string(),
        "date": status.date.to_string(),
        "status": status.status.as_str(),
        "opened_by": status.opened_by.as_ref().map(operator_json),
        "closed_by": status.closed_by.as_ref().map(operator_json),
        "initial_balance": money_json(status.initial_balance),
        "expenses": expenses_json(&status.expenses),
        "notes": status.notes,
        "sales": status.sales.as_ref().map(sales_json),
        "totals": status.live.as_ref().map(live_json),
        "snapshot": status.snapshot.as_ref().map(snapshot_json),
        "sales_warning": status.sales_warning,
    })
}

pub fn history_view_json(view: &CashRecordView) -> JsonValue {
    json!({
        "record_id": view.record_id.to_string(),
        "date": view.date.to_string(),
        "status": view.status.as_str(),
        "opened_by": operator_json(&view.opened_by),
        "closed_by": view.closed_by.as_ref().map(operator_json),
        "initial_balance": money_json(view.initial_balance),
        "expenses": expenses_json(&view.expenses),
        "notes": view.notes,
        "snapshot": view.snapshot.as_ref().map(snapshot_json),
    })
}
