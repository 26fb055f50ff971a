//! Caller authentication and the acting capability.
//!
//! Sessions are issued by an upstream auth gateway. The gateway proves itself
//! with a pre-shared key (checked in constant time) and forwards the signed-in
//! user as `x-user-id` / `x-user-role` headers, which become an [`Actor`].

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::models::{Role, UserId};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the signed-in user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the signed-in user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

const NOT_SIGNED_IN: &str = "請先登入";
const OTHERS_SCHEDULE: &str = "權限不足，只有經理可以操作他人班表";
const MANAGER_ONLY: &str = "權限不足，僅限經理使用";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    // Get the API key from the request header
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) => {
            if constant_time_compare(&provided_key, &expected) {
                next.run(request).await
            } else {
                unauthorized_response("Invalid API key")
            }
        }
        None => {
            // Also check Authorization header as bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_key) if constant_time_compare(&bearer_key, &expected) => {
                    next.run(request).await
                }
                _ => unauthorized_response("Missing or invalid API key"),
            }
        }
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}

/// The signed-in user on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Whose schedule a request acts on.
    ///
    /// Anyone may act on their own schedule; only managers may name another user.
    pub fn resolve_target(&self, target: Option<UserId>) -> Result<UserId, AppError> {
        match target {
            None => Ok(self.user_id),
            Some(id) if id == self.user_id => Ok(id),
            Some(id) if self.is_manager() => Ok(id),
            Some(_) => Err(AppError::Forbidden(OTHERS_SCHEDULE.to_string())),
        }
    }

    /// Fail unless the actor is a manager.
    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden(MANAGER_ONLY.to_string()))
        }
    }

    fn from_headers(parts: &Parts) -> Option<Self> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        };

        let user_id = header(USER_ID_HEADER)?.parse::<UserId>().ok()?;
        let role = Role::from_str(header(USER_ROLE_HEADER)?)?;
        (user_id > 0).then_some(Self { user_id, role })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(parts).ok_or_else(|| AppError::Unauthorized(NOT_SIGNED_IN.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(user: Option<&str>, role: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        if let Some(role) = role {
            builder = builder.header(USER_ROLE_HEADER, role);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_actor_from_headers() {
        let actor = Actor::from_headers(&parts(Some("7"), Some("Employee"))).unwrap();
        assert_eq!(actor.user_id, 7);
        assert!(!actor.is_manager());

        assert!(Actor::from_headers(&parts(None, Some("Employee"))).is_none());
        assert!(Actor::from_headers(&parts(Some("7"), None)).is_none());
        assert!(Actor::from_headers(&parts(Some("seven"), Some("Employee"))).is_none());
        assert!(Actor::from_headers(&parts(Some("7"), Some("Admin"))).is_none());
        assert!(Actor::from_headers(&parts(Some("0"), Some("Manager"))).is_none());
    }

    #[test]
    fn test_employee_can_only_target_self() {
        let employee = Actor {
            user_id: 7,
            role: Role::Employee,
        };
        assert_eq!(employee.resolve_target(None).unwrap(), 7);
        assert_eq!(employee.resolve_target(Some(7)).unwrap(), 7);
        assert!(matches!(
            employee.resolve_target(Some(8)),
            Err(AppError::Forbidden(_))
        ));
        assert!(employee.require_manager().is_err());
    }

    #[test]
    fn test_manager_can_target_anyone() {
        let manager = Actor {
            user_id: 1,
            role: Role::Manager,
        };
        assert_eq!(manager.resolve_target(Some(8)).unwrap(), 8);
        assert_eq!(manager.resolve_target(None).unwrap(), 1);
        assert!(manager.require_manager().is_ok());
    }
}
