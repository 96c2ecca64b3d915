use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::timeclock::SqlReportBuilder;
use crate::timeclock::error::TimeclockError;
use crate::timeclock::report::RangeRow;

#[derive(Deserialize, IntoParams)]
pub struct RangeQuery {
    /// Omit for all employees.
    pub employee_id: Option<u64>,
    /// First local day of the window, inclusive.
    pub from: Option<NaiveDate>,
    /// Last local day of the window, inclusive.
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct DayQuery {
    pub employee_id: u64,
    /// Local calendar date; defaults to today.
    pub date: Option<NaiveDate>,
}

/// A range-report row with the owning employee resolved for display.
#[derive(Serialize, ToSchema)]
pub struct RangeReportItem {
    #[schema(example = "Maya Rahman")]
    pub employee_name: Option<String>,
    #[schema(example = "maya.r")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub row: RangeRow,
}

#[derive(sqlx::FromRow)]
struct EmployeeNameRow {
    id: u64,
    first_name: String,
    last_name: String,
    username: String,
}

async fn employee_names(
    pool: &MySqlPool,
) -> Result<HashMap<u64, (String, String)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmployeeNameRow>(
        "SELECT id, first_name, last_name, username FROM employees",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.id,
                (format!("{} {}", r.first_name, r.last_name), r.username),
            )
        })
        .collect())
}

/// Attendance listing over a date window, newest first, with computed
/// per-row minutes.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(RangeQuery),
    responses(
        (status = 200, description = "Report rows", body = [RangeReportItem]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn range_report(
    pool: web::Data<MySqlPool>,
    reports: web::Data<SqlReportBuilder>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder, TimeclockError> {
    let now = reports.clock().now();
    let from = query.from.map(|d| reports.clock().start_of_local_day(d));
    let to = query.to.map(|d| reports.clock().end_of_local_day(d));

    let rows = reports
        .range_report(query.employee_id, from, to, now)
        .await?;

    let names = employee_names(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to resolve employee names");
        TimeclockError::Storage(e)
    })?;

    let items: Vec<RangeReportItem> = rows
        .into_iter()
        .map(|row| {
            let resolved = names.get(&row.attendance.employee_id);
            RangeReportItem {
                employee_name: resolved.map(|(name, _)| name.clone()),
                username: resolved.map(|(_, username)| username.clone()),
                row,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(items))
}

/// Per-day minute total for one employee, split at local midnight.
#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    params(DayQuery),
    responses(
        (status = 200, description = "Day summary", body = crate::timeclock::report::DaySummary),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn daily_summary(
    reports: web::Data<SqlReportBuilder>,
    query: web::Query<DayQuery>,
) -> Result<impl Responder, TimeclockError> {
    let now = reports.clock().now();
    let date = query.date.unwrap_or_else(|| reports.clock().local_date(now));
    let summary = reports.daily_total(query.employee_id, date, now).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// A day's completed sessions with synthetic break rows for the gaps.
#[utoipa::path(
    get,
    path = "/api/v1/reports/sessions",
    params(DayQuery),
    responses(
        (status = 200, description = "Sessions and breaks, chronological"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn detailed_sessions(
    reports: web::Data<SqlReportBuilder>,
    query: web::Query<DayQuery>,
) -> Result<impl Responder, TimeclockError> {
    let now = reports.clock().now();
    let date = query.date.unwrap_or_else(|| reports.clock().local_date(now));
    let entries = reports
        .detailed_sessions(query.employee_id, date, now)
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Administrative delete of a single attendance record.
#[utoipa::path(
    delete,
    path = "/api/v1/reports/{record_id}",
    params(("record_id", Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn delete_record(
    auth: AuthUser,
    reports: web::Data<SqlReportBuilder>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let record_id = path.into_inner();

    let deleted = reports.delete_record(record_id).await?;
    if !deleted {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Not found" })));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Deleted" })))
}
