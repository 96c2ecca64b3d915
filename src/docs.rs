use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::attendance::ClockReq;
use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::report::RangeReportItem;
use crate::auth::handlers::{ForgotPasswordReq, LoginResponse};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::models::LoginReq;
use crate::timeclock::report::{DayRecord, DayReport, DaySummary, RangeRow, SessionEntry};
use crate::timeclock::session::{EmployeeStatus, SessionStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shiftdesk API",
        version = "1.0.0",
        description = r#"
## Restaurant back-office attendance

PIN-verified clock-in/clock-out, timezone-correct shift-hour computation,
and day-bucketed attendance reporting.

### Key features
- **Attendance**
  - Kiosk clock-in/clock-out with PIN, open-session status board
- **Employees**
  - Staff profiles, roles, PIN management
- **Reports**
  - Day summaries split at local midnight, session drill-down

### Security
Kiosk endpoints authenticate per-call with an employee PIN; everything
else requires a **JWT Bearer** token issued at `/auth/login`.

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::forgot_password,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::status,
        crate::api::attendance::status_one,
        crate::api::attendance::records_by_date,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::report::range_report,
        crate::api::report::daily_summary,
        crate::api::report::detailed_sessions,
        crate::api::report::delete_record,
    ),
    components(
        schemas(
            LoginReq,
            LoginResponse,
            ForgotPasswordReq,
            ClockReq,
            AttendanceRecord,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse,
            SessionStatus,
            EmployeeStatus,
            DaySummary,
            DayRecord,
            DayReport,
            SessionEntry,
            RangeRow,
            RangeReportItem
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token lifecycle"),
        (name = "Attendance", description = "Clock-in/out and status APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Report", description = "Attendance reporting APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
