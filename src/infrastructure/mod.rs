pub mod card_gateway;
pub mod models;
pub mod order_gateway;
pub mod payment_gateway;
pub mod session_repo;

use crate::domain::errors::CheckoutError;

/// Map a reqwest transport failure onto the domain taxonomy. Timeouts are
/// distinguished so a hung upstream returns the flow to its pre-call state
/// instead of reading as a provider rejection.
pub(crate) fn transport_error(operation: &'static str, e: reqwest::Error) -> CheckoutError {
    if e.is_timeout() {
        CheckoutError::TimedOut(operation)
    } else {
        CheckoutError::Gateway(format!("{}: {}", operation, e))
    }
}
