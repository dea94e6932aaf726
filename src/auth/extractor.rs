use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::approval::Actor;
use crate::auth::jwt;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub person_id: Option<Uuid>,
}

impl AuthUser {
    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.role.can_approve() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Manager access required".to_string()))
        }
    }

    pub fn require_super_admin(&self) -> Result<(), AppError> {
        if self.role == Role::SuperAdmin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Super admin access required".to_string(),
            ))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get("authorization") {
            Some(header) => {
                let value = header.to_str().map_err(|_| {
                    AppError::Unauthorized("Invalid authorization header".to_string())
                })?;
                value
                    .strip_prefix("Bearer ")
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Unauthorized("Invalid authorization header".to_string())
                    })?
            }
            None => CookieJar::from_headers(&parts.headers)
                .get("access_token")
                .map(|c| c.value().to_string())
                .ok_or_else(|| {
                    AppError::Unauthorized("Missing authentication token".to_string())
                })?,
        };

        let claims = jwt::decode_token(&token, &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            person_id: claims.pid,
        })
    }
}
