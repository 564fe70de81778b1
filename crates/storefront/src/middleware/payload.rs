//! JSON request body extractor.
//!
//! [`Payload`] behaves like `axum::Json` with two differences: a malformed
//! body is rejected with the `INVALID_REQUEST` envelope instead of a 4xx
//! status, and an empty body is read as `{}` so operations whose fields are
//! all optional can be called without one.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A JSON body of type `T`.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid(rejection.body_text()))?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        Json::<T>::from_bytes(body)
            .map(|Json(value)| Self(value))
            .map_err(|rejection| AppError::invalid(rejection.body_text()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;
    use storehouse_core::codes;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct CartRef {
        cart_id: Option<i32>,
    }

    async fn extract(body: &'static str) -> Result<Payload<CartRef>, AppError> {
        let request = Request::builder().body(Body::from(body)).unwrap();
        Payload::<CartRef>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn test_empty_body_is_an_empty_object() {
        let Payload(body) = extract("").await.unwrap();
        assert!(body.cart_id.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_request() {
        let err = extract("{\"cart_id\":").await.unwrap_err();
        assert_eq!(err.envelope().code, codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_reads_without_content_type() {
        let Payload(body) = extract("{\"cart_id\": 4}").await.unwrap();
        assert_eq!(body.cart_id, Some(4));
    }
}
