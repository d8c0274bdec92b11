use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("Activation window must start strictly before it ends")]
    InvalidActivationWindow,
    #[error("Card quantity {requested} does not match the {ordered} ordered unit(s)")]
    QuantityMismatch { requested: i32, ordered: i32 },
    #[error("Cannot confirm {step}: {missing} has not been confirmed yet")]
    StepNotReady {
        step: &'static str,
        missing: &'static str,
    },
    #[error("No card type is cached for this session")]
    MissingCardType,
    #[error("No invoice is cached for this session")]
    MissingInvoice,
    #[error("Unsupported payment method: {0:?}")]
    UnsupportedPaymentMethod(String),
    #[error("Order service rejected the draft order: {0}")]
    OrderRejected(String),
    #[error("Card provisioning failed: {0}")]
    ProvisioningFailed(String),
    #[error("Card activation failed: {0}")]
    ActivationFailed(String),
    #[error("Payment provider {provider} refused to initiate payment: {reason}")]
    PaymentInitiationFailed {
        provider: &'static str,
        reason: String,
    },
    #[error("{0} timed out")]
    TimedOut(&'static str),
    #[error("Gateway transport error: {0}")]
    Gateway(String),
    #[error("Session store error: {0}")]
    Store(String),
}

/// Outcome of a best-effort compensating action (discarding a stale draft
/// order). A failure here is logged and surfaced as a soft notification but
/// never propagated as a hard error: an orphaned draft order is a
/// recoverable outcome, cleaned up server-side or on the next cancel.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationResult {
    Ok,
    Failed(String),
}

impl CompensationResult {
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failed(reason) => Some(reason),
        }
    }

    /// Log and pass through, so call sites can still surface the soft
    /// notification to the operator.
    pub fn logged(self, context: &str) -> Self {
        if let Self::Failed(reason) = &self {
            log::warn!("Compensation failed while {}: {}", context, reason);
        }
        self
    }
}
