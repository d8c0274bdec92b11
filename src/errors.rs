use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::CheckoutError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Checkout session not found")]
    NotFound,

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Checkout(e) => match e {
                // Operator-correctable input problems.
                CheckoutError::Validation { .. }
                | CheckoutError::InvalidActivationWindow
                | CheckoutError::QuantityMismatch { .. }
                | CheckoutError::StepNotReady { .. }
                | CheckoutError::UnsupportedPaymentMethod(_) => StatusCode::UNPROCESSABLE_ENTITY,
                // The session is missing something a prior step should have
                // cached.
                CheckoutError::MissingCardType | CheckoutError::MissingInvoice => {
                    StatusCode::CONFLICT
                }
                // Upstream said no.
                CheckoutError::OrderRejected(_)
                | CheckoutError::ProvisioningFailed(_)
                | CheckoutError::ActivationFailed(_)
                | CheckoutError::PaymentInitiationFailed { .. }
                | CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
                CheckoutError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Internal details stay out of responses.
            AppError::Internal(_) | AppError::Checkout(CheckoutError::Store(_)) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;

    use super::*;

    #[test]
    fn not_found_returns_404() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_errors_return_422() {
        let err: AppError = CheckoutError::InvalidActivationWindow.into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = CheckoutError::UnsupportedPaymentMethod("paypal".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn precondition_errors_return_409() {
        let err: AppError = CheckoutError::MissingCardType.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: AppError = CheckoutError::MissingInvoice.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn upstream_rejections_return_502() {
        let err: AppError = CheckoutError::OrderRejected("nope".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err: AppError = CheckoutError::PaymentInitiationFailed {
            provider: "momo",
            reason: "status 99".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn timeouts_return_504() {
        let err: AppError = CheckoutError::TimedOut("payment initiation").into();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn store_errors_hide_their_details() {
        let err: AppError = CheckoutError::Store("pg password".to_string()).into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn checkout_error_message_passes_through() {
        let err: AppError = CheckoutError::MissingCardType.into();
        assert_eq!(err.to_string(), "No card type is cached for this session");
    }
}
