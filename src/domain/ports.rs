use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::checkout::{
    CardBatch, CardProvisionRequest, CheckoutSession, CustomerInfo, DraftOrder, OrderReceipt,
    PaymentProvider,
};
use super::errors::CheckoutError;

/// Client contract for the upstream order service. A pure I/O boundary: no
/// business logic beyond shaping the request payload.
#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    async fn create_order(&self, draft: &DraftOrder) -> Result<OrderReceipt, CheckoutError>;

    /// Idempotent from the caller's perspective: deleting an order that no
    /// longer exists succeeds.
    async fn delete_order(&self, order_id: &str) -> Result<(), CheckoutError>;
}

/// Client contract for the upstream card (ETag) service.
#[async_trait]
pub trait CardGateway: Send + Sync + 'static {
    async fn generate_cards(
        &self,
        request: &CardProvisionRequest,
    ) -> Result<CardBatch, CheckoutError>;

    async fn activate_card(
        &self,
        card_id: &str,
        customer: &CustomerInfo,
    ) -> Result<(), CheckoutError>;
}

/// Dispatches a payment-initiation request to one of the redirect-based
/// providers and normalizes its response into a single redirect URL. Cash is
/// not a `PaymentProvider`, so callers special-case it by construction.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn initiate(
        &self,
        provider: PaymentProvider,
        invoice_id: &str,
    ) -> Result<String, CheckoutError>;
}

/// Durable per-checkout cache. Sync on purpose: the diesel implementation
/// blocks, and callers run it through `web::block`.
pub trait SessionStore: Send + Sync + 'static {
    fn load(&self, id: Uuid) -> Result<Option<CheckoutSession>, CheckoutError>;
    fn save(&self, session: &CheckoutSession) -> Result<(), CheckoutError>;
    fn delete(&self, id: Uuid) -> Result<(), CheckoutError>;

    /// Sessions not touched since `cutoff`, for the startup sweep.
    fn idle_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<CheckoutSession>, CheckoutError>;
}
