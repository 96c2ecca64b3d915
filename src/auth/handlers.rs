use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_secret,
    },
    config::Config,
    models::{CredentialRow, LoginReq, TokenType},
};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: u64,
    employee_id: u64,
    revoked: bool,
}

/// Back-office login for admins and managers. Staff clock in with a PIN and
/// never hold a token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Tokens issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, req),
    fields(username = %req.username)
)]
pub async fn login(
    req: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if req.username.trim().is_empty() || req.password.is_empty() {
        return HttpResponse::BadRequest().body("Username or password required");
    }

    let employee = match sqlx::query_as::<_, CredentialRow>(
        r#"
        SELECT id, username, password, role_id, status
        FROM employees
        WHERE username = ?
        "#,
    )
    .bind(&req.username)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(row)) => row,
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching employee");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if employee.status != "active" {
        info!("Login rejected: employee not active");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    if !verify_secret(&req.password, &employee.password) {
        info!("Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    debug!("Password verified, issuing tokens");

    let tokens = issue_token_pair(&employee, pool.get_ref(), &config).await;
    match tokens {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            error!(error = %e, "Failed to issue tokens");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn issue_token_pair(
    employee: &CredentialRow,
    pool: &MySqlPool,
    config: &Config,
) -> anyhow::Result<LoginResponse> {
    let access_token = generate_access_token(
        employee.id,
        employee.username.clone(),
        employee.role_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        employee.id,
        employee.username.clone(),
        employee.role_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (employee_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(employee.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Rotate a refresh token: revoke the presented one, issue a fresh pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Invalid or revoked refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::Unauthorized().body("No token");
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let record = match sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, employee_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(r)) if !r.revoked => r,
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Database error while fetching refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let credential = CredentialRow {
        id: record.employee_id,
        username: claims.sub.clone(),
        password: String::new(),
        role_id: claims.role,
        status: "active".into(),
    };

    match issue_token_pair(&credential, pool.get_ref(), &config).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            error!(error = %e, "Failed to rotate tokens");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Revoke the presented refresh token. Succeeds even when the token is
/// already gone.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked")),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordReq {
    #[schema(example = "maya.r")]
    pub username: String,
    pub new_password: String,
}

/// Reset a password by username. Manager/admin only; the new secret is
/// hashed before it is stored.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Password updated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn forgot_password(
    auth: crate::auth::auth::AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<ForgotPasswordReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if body.new_password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Username and new password are required"
        })));
    }

    let hashed = crate::auth::password::hash_secret(&body.new_password).map_err(|e| {
        error!(error = %e, "Failed to hash replacement password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query("UPDATE employees SET password = ? WHERE username = ?")
        .bind(&hashed)
        .bind(&body.username)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update password");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })))
}
