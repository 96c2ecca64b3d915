use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_secret;
use crate::model::employee::Employee;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Maya")]
    pub first_name: String,
    #[schema(example = "Rahman")]
    pub last_name: String,
    #[schema(example = "maya.r")]
    pub username: String,
    #[schema(example = "hunter2")]
    pub password: String,
    /// Clock-in PIN; optional until the employee is put on the rota.
    #[schema(example = "4321", nullable = true)]
    pub pin: Option<String>,
    #[schema(example = 3)]
    pub role_id: Option<u8>,
    #[schema(example = "maya@restaurant.example", nullable = true)]
    pub email: Option<String>,
    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub joining_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Re-hashed before storage when present.
    pub password: Option<String>,
    pub pin: Option<String>,
    pub role_id: Option<u8>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub joining_date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee added", body = Object, example = json!({
            "message": "Employee added"
        })),
        (status = 409, description = "Username already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Password is required"
        })));
    }

    let hashed_password = hash_secret(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ErrorInternalServerError("Internal Server Error")
    })?;
    let hashed_pin = match &payload.pin {
        Some(pin) => Some(hash_secret(pin).map_err(|e| {
            error!(error = %e, "Failed to hash PIN");
            ErrorInternalServerError("Internal Server Error")
        })?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (first_name, last_name, username, password, pin, role_id, email, phone, joining_date, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'active')
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(&hashed_pin)
    .bind(payload.role_id.unwrap_or(3))
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.joining_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Employee added"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "Username already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Server error while adding employee"
            })))
        }
    }
}

/// List employees, paginated, with optional status filter and name search.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR username LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({ "error": "Employee not found" }))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Object, example = json!({
            "message": "Employee updated"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;
    let employee_id = path.into_inner();
    let mut payload = body.into_inner();

    // Secrets are stored hashed, never verbatim.
    if let Some(password) = &payload.password {
        payload.password = Some(hash_secret(password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ErrorInternalServerError("Internal Server Error")
        })?);
    }
    if let Some(pin) = &payload.pin {
        payload.pin = Some(hash_secret(pin).map_err(|e| {
            error!(error = %e, "Failed to hash PIN");
            ErrorInternalServerError("Internal Server Error")
        })?);
    }

    let result = sqlx::query(
        r#"
        UPDATE employees SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            username = COALESCE(?, username),
            password = COALESCE(?, password),
            pin = COALESCE(?, pin),
            role_id = COALESCE(?, role_id),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            joining_date = COALESCE(?, joining_date),
            status = COALESCE(?, status)
        WHERE id = ?
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.username)
    .bind(&payload.password)
    .bind(&payload.pin)
    .bind(payload.role_id)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.joining_date)
    .bind(&payload.status)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to update employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Employee not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated" })))
}

/// Delete Employee, along with their attendance history.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deleted", body = Object, example = json!({
            "message": "Employee deleted"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let mut tx = pool.get_ref().begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to delete attendance rows");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to delete employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Employee not found" })));
    }

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit employee delete");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deleted" })))
}
