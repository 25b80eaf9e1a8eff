//! Request extractors that report rejections through [`AppError`].
//!
//! axum's own `Json` and `Path` extractors answer bad input with plain-text
//! bodies. These wrappers keep every failure in the JSON error format.

use axum::{
    async_trait,
    extract::{rejection::PathRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body; malformed or mistyped bodies become `Validation` errors.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// Path parameters; an id that does not parse cannot name an existing
/// resource, so it is reported as `NotFound`.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                Err(AppError::NotFound(e.body_text()))
            }
            Err(other) => Err(AppError::Internal(other.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{self, header, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Counter {
        count: u32,
    }

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        let ApiJson(body) = ApiJson::<Counter>::from_request(json_request(r#"{"count": 3}"#), &())
            .await
            .unwrap();
        assert_eq!(body.count, 3);
    }

    #[tokio::test]
    async fn test_bad_bodies_become_validation_errors() {
        for body in [r#"{"count": "x"}"#, "{not json", "{}"] {
            let err = ApiJson::<Counter>::from_request(json_request(body), &())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{body}");
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_validation_error() {
        let request = http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"count": 1}"#))
            .unwrap();
        let err = ApiJson::<Counter>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
