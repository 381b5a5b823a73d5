//! Tenant scoping from the `X-Workspace-Id` header.
//!
//! Authentication and roles are enforced by the gateway in front of this service,
//! which forwards the caller's workspace in this header.

use axum::{extract::FromRequestParts, http::request::Parts};
use kasa_shared::{AppError, types::WorkspaceId};

use crate::error::ApiError;

/// Header carrying the caller's workspace id.
pub const WORKSPACE_HEADER: &str = "x-workspace-id";

/// The workspace every query of the request is scoped to.
///
/// ```ignore
/// async fn handler(workspace: WorkspaceContext) -> impl IntoResponse {
///     let workspace_id = workspace.id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceContext(pub WorkspaceId);

impl WorkspaceContext {
    /// Returns the workspace id.
    #[must_use]
    pub const fn id(&self) -> WorkspaceId {
        self.0
    }
}

impl<S> FromRequestParts<S> for WorkspaceContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(WORKSPACE_HEADER)
            .ok_or_else(|| AppError::Validation("X-Workspace-Id header is required".to_string()))?
            .to_str()
            .map_err(|_| AppError::Validation("X-Workspace-Id must be ASCII".to_string()))?;

        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(WorkspaceId::new(id))),
            _ => Err(AppError::Validation(format!("Invalid X-Workspace-Id: {raw}")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use rstest::rstest;

    async fn extract(header: Option<&str>) -> Result<WorkspaceContext, ApiError> {
        let mut builder = Request::builder().uri("/api/v1/transactions");
        if let Some(value) = header {
            builder = builder.header(WORKSPACE_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        WorkspaceContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_workspace_header() {
        let ctx = extract(Some("42")).await.unwrap();
        assert_eq!(ctx.id(), WorkspaceId::new(42));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("abc"))]
    #[case(Some("0"))]
    #[case(Some("-3"))]
    #[tokio::test]
    async fn test_missing_or_malformed_header_is_bad_request(#[case] header: Option<&str>) {
        let err = extract(header).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
