use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("missing required fields: {0}")]
    MissingRequiredFields(String),

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("invalid postal code: {0}")]
    InvalidPostalCode(String),

    #[error("invalid delivery policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid warehouse: {0}")]
    InvalidWarehouse(String),

    #[error("warehouse {0} not found")]
    WarehouseNotFound(Uuid),

    #[error("warehouse {warehouse_id} does not deliver to postal code {postal_code}")]
    PincodeNotSupported {
        warehouse_id: Uuid,
        postal_code: String,
    },

    #[error(
        "warehouse {warehouse_id} is {distance_km:.2} km away, beyond its {max_radius_km:.2} km delivery radius"
    )]
    DeliveryRadiusExceeded {
        warehouse_id: Uuid,
        distance_km: f64,
        max_radius_km: f64,
    },

    #[error("warehouse {warehouse_id} is not delivering: {reason}")]
    WarehouseNotDelivering { warehouse_id: Uuid, reason: String },

    #[error("no warehouse available: {0}")]
    NoWarehouseAvailable(String),

    #[error("no cart warehouse available: {0}")]
    NoCartWarehouseAvailable(String),

    #[error("distance calculation failed: {0}")]
    DistanceCalculationFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::MissingRequiredFields(_) => "MISSING_REQUIRED_FIELDS",
            AppError::InvalidCoordinates(_) => "INVALID_COORDINATES",
            AppError::InvalidPostalCode(_) => "INVALID_POSTAL_CODE",
            AppError::InvalidPolicy(_) => "INVALID_POLICY",
            AppError::InvalidWarehouse(_) => "INVALID_WAREHOUSE",
            AppError::WarehouseNotFound(_) => "WAREHOUSE_NOT_FOUND",
            AppError::PincodeNotSupported { .. } => "PINCODE_NOT_SUPPORTED",
            AppError::DeliveryRadiusExceeded { .. } => "DELIVERY_RADIUS_EXCEEDED",
            AppError::WarehouseNotDelivering { .. } => "WAREHOUSE_NOT_DELIVERING",
            AppError::NoWarehouseAvailable(_) => "NO_WAREHOUSE_AVAILABLE",
            AppError::NoCartWarehouseAvailable(_) => "NO_CART_WAREHOUSE_AVAILABLE",
            AppError::DistanceCalculationFailed(_) => "DISTANCE_CALCULATION_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::MissingRequiredFields(_)
            | AppError::InvalidCoordinates(_)
            | AppError::InvalidPostalCode(_)
            | AppError::InvalidPolicy(_)
            | AppError::InvalidWarehouse(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::WarehouseNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PincodeNotSupported { .. }
            | AppError::DeliveryRadiusExceeded { .. }
            | AppError::WarehouseNotDelivering { .. }
            | AppError::NoWarehouseAvailable(_)
            | AppError::NoCartWarehouseAvailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DistanceCalculationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
