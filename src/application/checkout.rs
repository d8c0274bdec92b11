use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::checkout::{
    ActivationWindow, CardInfoForm, CardProvisionRequest, CheckoutSession, CustomerInfo,
    CustomerInfoForm, DraftOrder, OrderReceipt, PaymentMethod,
};
use crate::domain::errors::{CheckoutError, CompensationResult};
use crate::domain::ports::{CardGateway, OrderGateway, PaymentGateway, SessionStore};

/// Result of submitting customer info: the identifiers of the freshly
/// created draft order, plus the outcome of discarding the one it replaced.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub receipt: OrderReceipt,
    pub stale_discard: CompensationResult,
}

/// Terminal outcome of the confirm-order step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Cash was taken at the counter; the flow is complete locally.
    CashCompleted,
    /// Hand the customer off to the provider's payment page.
    Redirect(String),
}

/// Sequences the order-to-activation workflow: discard any stale draft,
/// create a new draft order, collect the activation window, provision the
/// cards, then finalize locally (cash) or hand off to a payment provider.
///
/// The orchestrator owns no per-checkout state; every step mutates the
/// `CheckoutSession` the caller passes in. Gateway calls are strictly
/// sequential because each depends on identifiers produced by the previous
/// one.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    orders: Arc<dyn OrderGateway>,
    cards: Arc<dyn CardGateway>,
    payments: Arc<dyn PaymentGateway>,
}

impl CheckoutOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderGateway>,
        cards: Arc<dyn CardGateway>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            orders,
            cards,
            payments,
        }
    }

    /// Step 1: create a draft order from the customer/order form.
    ///
    /// Any draft already cached on the session is discarded first
    /// (best-effort, never fatal), so at most one draft order is ever live
    /// per session. On failure the session is left blank: no flag is set and
    /// no identifier is cached.
    pub async fn submit_customer_info(
        &self,
        session: &mut CheckoutSession,
        form: CustomerInfoForm,
    ) -> Result<SubmitOutcome, CheckoutError> {
        let method = PaymentMethod::parse(&form.payment_method)
            .ok_or_else(|| CheckoutError::UnsupportedPaymentMethod(form.payment_method.clone()))?;
        if form.lines.is_empty() {
            return Err(CheckoutError::Validation {
                field: "lines",
                message: "at least one order line is required".to_string(),
            });
        }
        if form.lines.iter().any(|l| l.quantity <= 0) {
            return Err(CheckoutError::Validation {
                field: "quantity",
                message: "line quantity must be positive".to_string(),
            });
        }

        let stale_discard = self
            .discard_draft(session)
            .await
            .logged("discarding a stale draft order on restart");
        session.reset();

        let draft = DraftOrder::new(
            form.sale_type.clone(),
            method,
            form.lines.clone(),
            form.customer.clone(),
        );
        let receipt = self.orders.create_order(&draft).await?;

        session.sale_type = Some(form.sale_type);
        session.payment_method = Some(method);
        session.customer = Some(form.customer);
        session.lines = form.lines;
        session.card_type_id = Some(form.card_type_id);
        session.order = Some(receipt.clone());
        session.confirmation.customer_info = true;

        Ok(SubmitOutcome {
            receipt,
            stale_discard,
        })
    }

    /// Step 2: confirm the activation window. Local validation only, no
    /// gateway I/O; an already-known-invalid window is never sent upstream.
    pub fn confirm_card_info(
        &self,
        session: &mut CheckoutSession,
        form: CardInfoForm,
    ) -> Result<(), CheckoutError> {
        if !session.confirmation.customer_info {
            return Err(CheckoutError::StepNotReady {
                step: "card info",
                missing: "customer info",
            });
        }
        if form.quantity <= 0 {
            return Err(CheckoutError::Validation {
                field: "quantity",
                message: "card quantity must be positive".to_string(),
            });
        }
        let window = ActivationWindow {
            start_date: form.start_date,
            end_date: form.end_date,
        };
        if !window.is_valid() {
            return Err(CheckoutError::InvalidActivationWindow);
        }
        let ordered = session.ordered_units();
        if form.quantity != ordered {
            return Err(CheckoutError::QuantityMismatch {
                requested: form.quantity,
                ordered,
            });
        }

        session.card_window = Some(window);
        session.card_quantity = Some(form.quantity);
        session.confirmation.card_info = true;
        Ok(())
    }

    /// Step 3: provision the cards, then finalize.
    ///
    /// Provisioning runs at most once per draft order: a batch cached by an
    /// earlier attempt (payment initiation failed) is reused, so retrying
    /// only repeats the failed step. A provisioning failure aborts before
    /// any payment call; the flow stays retryable with all earlier state
    /// intact.
    pub async fn confirm_order(
        &self,
        session: &mut CheckoutSession,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if !session.confirmation.card_info {
            return Err(CheckoutError::StepNotReady {
                step: "the order",
                missing: "card info",
            });
        }
        let card_type_id = session.card_type_id.ok_or(CheckoutError::MissingCardType)?;
        let (window, quantity) = match (session.card_window, session.card_quantity) {
            (Some(w), Some(q)) => (w, q),
            _ => {
                return Err(CheckoutError::StepNotReady {
                    step: "the order",
                    missing: "card info",
                })
            }
        };
        let method = session.payment_method.ok_or(CheckoutError::StepNotReady {
            step: "the order",
            missing: "customer info",
        })?;

        if session.card_batch.is_none() {
            let request = CardProvisionRequest {
                quantity,
                card_type_id,
                window,
            };
            let batch = self.cards.generate_cards(&request).await?;
            session.card_batch = Some(batch);
        }

        match method.provider() {
            None => {
                session.confirmation.cash_payment = true;
                session.confirmation.order = true;
                Ok(CheckoutOutcome::CashCompleted)
            }
            Some(provider) => {
                let invoice_id = session
                    .order
                    .as_ref()
                    .map(|o| o.invoice_id.clone())
                    .ok_or(CheckoutError::MissingInvoice)?;
                let url = self.payments.initiate(provider, &invoice_id).await?;
                Ok(CheckoutOutcome::Redirect(url))
            }
        }
    }

    /// Cancel from any state: best-effort discard of the cached draft, then
    /// an unconditional full reset. The reset happens even when the discard
    /// fails.
    pub async fn cancel(&self, session: &mut CheckoutSession) -> CompensationResult {
        let result = self
            .discard_draft(session)
            .await
            .logged("discarding the draft order on cancel");
        session.reset();
        result
    }

    /// Pass-through to the card gateway; activation shares the gateway but
    /// is not part of the package-purchase sequence.
    pub async fn activate_card(
        &self,
        card_id: &str,
        customer: &CustomerInfo,
    ) -> Result<(), CheckoutError> {
        self.cards.activate_card(card_id, customer).await
    }

    /// Discard sessions that have been idle past `ttl`: best-effort delete
    /// of their draft order, then drop the row. This is the durable
    /// "discard on next load" fallback for flows abandoned mid-checkout
    /// (navigating away never guarantees the cancel handler ran).
    pub async fn sweep_stale(
        &self,
        store: &dyn SessionStore,
        ttl: Duration,
    ) -> Result<usize, CheckoutError> {
        let cutoff = Utc::now() - ttl;
        let stale = store.idle_since(cutoff)?;
        let mut swept = 0;
        for mut session in stale {
            let _ = self
                .discard_draft(&mut session)
                .await
                .logged("discarding a stale draft order during the sweep");
            store.delete(session.id)?;
            swept += 1;
        }
        Ok(swept)
    }

    /// Delete the cached draft order, if any. The card batch provisioned
    /// against it dies with it. Failures are soft: the caller logs and
    /// moves on.
    async fn discard_draft(&self, session: &mut CheckoutSession) -> CompensationResult {
        let Some(order) = session.order.take() else {
            return CompensationResult::Ok;
        };
        session.card_batch = None;
        match self.orders.delete_order(&order.order_id).await {
            Ok(()) => CompensationResult::Ok,
            Err(e) => CompensationResult::Failed(e.to_string()),
        }
    }
}
