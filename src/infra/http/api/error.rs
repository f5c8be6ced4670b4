use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_api_types::{ApiResponse, FieldError};

use crate::application::error::ErrorReport;
use crate::application::products::ProductError;
use crate::application::repos::RepoError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const INVALID_ID: &str = "invalid_id";
    pub const NOT_FOUND: &str = "not_found";
    pub const VALIDATION: &str = "validation_failed";
    pub const DUPLICATE: &str = "duplicate";
    pub const SKU_EXHAUSTED: &str = "sku_exhausted";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

const SOURCE: &str = "infra::http::api";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    errors: Option<Vec<FieldError>>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
            errors: None,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, "Invalid request").with_detail(detail)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, "Product not found")
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                codes::VALIDATION,
                "Validation failed",
            )
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound => ApiError::not_found(),
            ProductError::InvalidId(err) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_ID,
                "Invalid product id",
            )
            .with_detail(err.to_string()),
            ProductError::Validation(violations) => ApiError::validation(
                violations
                    .into_iter()
                    .map(|v| FieldError::new(v.field, v.message))
                    .collect(),
            ),
            ProductError::SkuExhausted { attempts } => ApiError::new(
                StatusCode::CONFLICT,
                codes::SKU_EXHAUSTED,
                "Could not allocate a unique SKU",
            )
            .with_detail(format!("gave up after {attempts} attempts")),
            ProductError::Repo(err) => repo_error(err),
        }
    }
}

fn repo_error(err: RepoError) -> ApiError {
    let detail = err.to_string();
    let error = match err {
        RepoError::NotFound => return ApiError::not_found(),
        RepoError::Duplicate { .. } => {
            ApiError::new(StatusCode::CONFLICT, codes::DUPLICATE, "Duplicate record")
        }
        RepoError::InvalidInput { .. } => {
            ApiError::new(StatusCode::BAD_REQUEST, codes::INVALID_INPUT, "Invalid input")
        }
        RepoError::Integrity { .. } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::DB_TIMEOUT,
            "Database timeout",
        ),
        RepoError::Persistence(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Repository error",
        ),
    };
    error.with_detail(detail)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report_message = format!(
            "{}: {}",
            self.code,
            self.detail.as_deref().unwrap_or(self.message)
        );
        let body: ApiResponse = ApiResponse::failure(self.code, self.message, self.errors);
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(SOURCE, self.status, report_message).attach(&mut response);
        response
    }
}
