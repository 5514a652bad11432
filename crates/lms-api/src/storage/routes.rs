use std::collections::BTreeMap;

use axum::{Router, routing::post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    ApiState,
    auth::AuthUser,
    response::{ApiResponse, ApiResult},
    validation::{ValidatedJson, require_text},
};

/// Placeholder bucket endpoint returned to clients
pub const UPLOAD_ENDPOINT: &str = "https://storage.invalid/uploads";
/// Lifetime of the returned upload form, in seconds
pub const UPLOAD_EXPIRES_IN: u64 = 900;

#[derive(Debug, Deserialize, Validate)]
pub struct UploadUrlRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct UploadUrl {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub expires_in: u64,
}

pub fn routes() -> Router<ApiState> {
    Router::new().route("/storage/upload-url", post(upload_url))
}

async fn upload_url(
    auth_user: AuthUser,
    ValidatedJson(req): ValidatedJson<UploadUrlRequest>,
) -> ApiResult<UploadUrl> {
    auth_user.require_instructor()?;
    require_text("filename", &req.filename)?;

    Ok(ApiResponse::ok(placeholder_upload(&req)))
}

fn placeholder_upload(req: &UploadUrlRequest) -> UploadUrl {
    let filename: String = req
        .filename
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    let fields = BTreeMap::from([
        ("key".to_string(), format!("uploads/{}/{filename}", Uuid::new_v4())),
        ("Content-Type".to_string(), req.content_type.clone()),
    ]);

    UploadUrl {
        url: UPLOAD_ENDPOINT.to_string(),
        fields,
        expires_in: UPLOAD_EXPIRES_IN,
    }
}
