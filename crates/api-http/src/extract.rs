//! Deploy body extractor
//!
//! Browsers post `FormData` (multipart), scripts post urlencoded forms or JSON.
//! All three land in the same `DeployForm`.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};

use crate::error::ApiError;
use crate::types::DeployForm;

pub struct DeployPayload(pub DeployForm);

impl<S> FromRequest<S> for DeployPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(form) = Json::<DeployForm>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Ok(Self(form));
        }

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return read_multipart(multipart).await.map(Self);
        }

        let Form(form) = Form::<DeployForm>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(form))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<DeployForm, ApiError> {
    let mut form = DeployForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "tf_code" && name != "do_token" {
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "tf_code" => form.tf_code = Some(value),
            _ => form.do_token = Some(value),
        }
    }
    Ok(form)
}
