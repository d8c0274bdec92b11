use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::checkout::{CheckoutOrchestrator, CheckoutOutcome};
use crate::domain::checkout::{
    CardInfoForm, CheckoutSession, CustomerInfo, CustomerInfoForm, OrderLine,
};
use crate::domain::errors::CheckoutError;
use crate::domain::ports::SessionStore;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerRequest {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub gender: String,
    pub national_id: String,
}

impl From<CustomerRequest> for CustomerInfo {
    fn from(c: CustomerRequest) -> Self {
        Self {
            full_name: c.full_name,
            phone_number: c.phone_number,
            address: c.address,
            gender: c.gender,
            national_id: c.national_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "150000"
    pub price: String,
    pub image_url: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerInfoRequest {
    pub sale_type: String,
    /// One of cash, momo, vnpay, payos, zalopay (case-insensitive).
    pub payment_method: String,
    pub card_type_id: Uuid,
    pub customer: CustomerRequest,
    pub lines: Vec<OrderLineRequest>,
}

impl CustomerInfoRequest {
    fn into_form(self) -> Result<CustomerInfoForm, CheckoutError> {
        let lines = self
            .lines
            .into_iter()
            .map(|l| {
                let price =
                    BigDecimal::from_str(&l.price).map_err(|e| CheckoutError::Validation {
                        field: "price",
                        message: format!("'{}' is not a valid decimal: {}", l.price, e),
                    })?;
                Ok(OrderLine {
                    product_id: l.product_id,
                    name: l.name,
                    price,
                    image_url: l.image_url,
                    quantity: l.quantity,
                })
            })
            .collect::<Result<Vec<_>, CheckoutError>>()?;
        Ok(CustomerInfoForm {
            sale_type: self.sale_type,
            payment_method: self.payment_method,
            card_type_id: self.card_type_id,
            customer: self.customer.into(),
            lines,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CardInfoRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub order_id: String,
    pub invoice_id: String,
    /// Present when discarding the previous draft order failed (soft).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmResponse {
    /// "completed" for cash, "redirect" for provider payments.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelResponse {
    pub cancelled: bool,
    /// Present when the draft-order discard failed (soft).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    pub customer_info_confirmed: bool,
    pub card_info_confirmed: bool,
    pub cash_payment_confirmed: bool,
    pub order_confirmed: bool,
    pub payment_method: Option<String>,
    pub order_id: Option<String>,
    pub invoice_id: Option<String>,
    pub card_ids: Vec<String>,
}

impl From<&CheckoutSession> for SessionView {
    fn from(s: &CheckoutSession) -> Self {
        Self {
            session_id: s.id,
            customer_info_confirmed: s.confirmation.customer_info,
            card_info_confirmed: s.confirmation.card_info,
            cash_payment_confirmed: s.confirmation.cash_payment,
            order_confirmed: s.confirmation.order,
            payment_method: s.payment_method.map(|m| m.as_str().to_string()),
            order_id: s.order.as_ref().map(|o| o.order_id.clone()),
            invoice_id: s.order.as_ref().map(|o| o.invoice_id.clone()),
            card_ids: s
                .card_batch
                .as_ref()
                .map(|b| b.card_ids.clone())
                .unwrap_or_default(),
        }
    }
}

// ── Session store plumbing ───────────────────────────────────────────────────
// The diesel store blocks, so every store call goes through `web::block`.

async fn fetch_session(
    store: &web::Data<dyn SessionStore>,
    id: Uuid,
) -> Result<Option<CheckoutSession>, AppError> {
    let store = store.clone().into_inner();
    web::block(move || store.load(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

async fn persist_session(
    store: &web::Data<dyn SessionStore>,
    session: CheckoutSession,
) -> Result<(), AppError> {
    let store = store.clone().into_inner();
    web::block(move || store.save(&session))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

async fn remove_session(
    store: &web::Data<dyn SessionStore>,
    id: Uuid,
) -> Result<(), AppError> {
    let store = store.clone().into_inner();
    web::block(move || store.delete(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /checkout/{session_id}/customer-info
///
/// Creates a draft order from the customer/order form. A draft cached by a
/// previous submission on the same session is discarded first; if that
/// discard fails the response still succeeds and carries a `warning`.
#[utoipa::path(
    post,
    path = "/checkout/{session_id}/customer-info",
    params(("session_id" = Uuid, Path, description = "Checkout session UUID")),
    request_body = CustomerInfoRequest,
    responses(
        (status = 200, description = "Draft order created", body = SubmitResponse),
        (status = 422, description = "Validation failure or unsupported payment method"),
        (status = 502, description = "Order service rejected the draft"),
    ),
    tag = "checkout"
)]
pub async fn submit_customer_info(
    orchestrator: web::Data<CheckoutOrchestrator>,
    store: web::Data<dyn SessionStore>,
    path: web::Path<Uuid>,
    body: web::Json<CustomerInfoRequest>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let form = body.into_inner().into_form()?;

    let mut session = fetch_session(&store, session_id)
        .await?
        .unwrap_or_else(|| CheckoutSession::new(session_id));

    let result = orchestrator.submit_customer_info(&mut session, form).await;
    // The session mutates on failure too (the stale draft is gone), so it is
    // persisted before the error propagates.
    persist_session(&store, session).await?;
    let outcome = result?;

    Ok(HttpResponse::Ok().json(SubmitResponse {
        order_id: outcome.receipt.order_id,
        invoice_id: outcome.receipt.invoice_id,
        warning: outcome.stale_discard.failure().map(str::to_string),
    }))
}

/// POST /checkout/{session_id}/card-info
///
/// Confirms the activation window. Validation is local; nothing is sent
/// upstream until the order is confirmed.
#[utoipa::path(
    post,
    path = "/checkout/{session_id}/card-info",
    params(("session_id" = Uuid, Path, description = "Checkout session UUID")),
    request_body = CardInfoRequest,
    responses(
        (status = 200, description = "Card info confirmed", body = SessionView),
        (status = 404, description = "Unknown session"),
        (status = 422, description = "Invalid window or quantity mismatch"),
    ),
    tag = "checkout"
)]
pub async fn confirm_card_info(
    orchestrator: web::Data<CheckoutOrchestrator>,
    store: web::Data<dyn SessionStore>,
    path: web::Path<Uuid>,
    body: web::Json<CardInfoRequest>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let body = body.into_inner();

    let mut session = fetch_session(&store, session_id)
        .await?
        .ok_or(AppError::NotFound)?;

    orchestrator.confirm_card_info(
        &mut session,
        CardInfoForm {
            start_date: body.start_date,
            end_date: body.end_date,
            quantity: body.quantity,
        },
    )?;
    let view = SessionView::from(&session);
    persist_session(&store, session).await?;

    Ok(HttpResponse::Ok().json(view))
}

/// POST /checkout/{session_id}/confirm
///
/// Provisions the cards and finalizes: cash completes locally (the session
/// cache is consumed), anything else returns the provider's redirect URL.
#[utoipa::path(
    post,
    path = "/checkout/{session_id}/confirm",
    params(("session_id" = Uuid, Path, description = "Checkout session UUID")),
    responses(
        (status = 200, description = "Completed or redirect issued", body = ConfirmResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Missing cached card type or invoice"),
        (status = 502, description = "Provisioning or payment initiation failed"),
    ),
    tag = "checkout"
)]
pub async fn confirm_order(
    orchestrator: web::Data<CheckoutOrchestrator>,
    store: web::Data<dyn SessionStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();

    let mut session = fetch_session(&store, session_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let result = orchestrator.confirm_order(&mut session).await;
    match &result {
        // Cash consumes the session; the cache is cleared like a cancel.
        Ok(CheckoutOutcome::CashCompleted) => remove_session(&store, session_id).await?,
        // Keep the cached batch around on failure so retry skips provisioning.
        _ => persist_session(&store, session).await?,
    }

    match result? {
        CheckoutOutcome::CashCompleted => Ok(HttpResponse::Ok().json(ConfirmResponse {
            status: "completed".to_string(),
            redirect_url: None,
        })),
        CheckoutOutcome::Redirect(url) => Ok(HttpResponse::Ok().json(ConfirmResponse {
            status: "redirect".to_string(),
            redirect_url: Some(url),
        })),
    }
}

/// POST /checkout/{session_id}/cancel
///
/// Discards the draft order (best-effort) and wipes the session. Always
/// succeeds; a failed discard is reported as a `warning`.
#[utoipa::path(
    post,
    path = "/checkout/{session_id}/cancel",
    params(("session_id" = Uuid, Path, description = "Checkout session UUID")),
    responses(
        (status = 200, description = "Session cancelled", body = CancelResponse),
    ),
    tag = "checkout"
)]
pub async fn cancel(
    orchestrator: web::Data<CheckoutOrchestrator>,
    store: web::Data<dyn SessionStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();

    let warning = match fetch_session(&store, session_id).await? {
        Some(mut session) => {
            let result = orchestrator.cancel(&mut session).await;
            remove_session(&store, session_id).await?;
            result.failure().map(str::to_string)
        }
        // Nothing cached; cancelling is a no-op.
        None => None,
    };

    Ok(HttpResponse::Ok().json(CancelResponse {
        cancelled: true,
        warning,
    }))
}

/// GET /checkout/{session_id}
///
/// Progress view: which steps are confirmed and which identifiers are
/// cached.
#[utoipa::path(
    get,
    path = "/checkout/{session_id}",
    params(("session_id" = Uuid, Path, description = "Checkout session UUID")),
    responses(
        (status = 200, description = "Session found", body = SessionView),
        (status = 404, description = "Unknown session"),
    ),
    tag = "checkout"
)]
pub async fn get_session(
    store: web::Data<dyn SessionStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = fetch_session(&store, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(SessionView::from(&session)))
}

/// POST /cards/{card_id}/activate
///
/// Activates a provisioned card with the holder's identity data. Shares the
/// card gateway but is independent of the checkout sequence.
#[utoipa::path(
    post,
    path = "/cards/{card_id}/activate",
    params(("card_id" = String, Path, description = "Card (ETag) identifier")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Card activated"),
        (status = 502, description = "Card service rejected the activation"),
    ),
    tag = "cards"
)]
pub async fn activate_card(
    orchestrator: web::Data<CheckoutOrchestrator>,
    path: web::Path<String>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let card_id = path.into_inner();
    let customer: CustomerInfo = body.into_inner().into();
    orchestrator.activate_card(&card_id, &customer).await?;
    Ok(HttpResponse::Ok().json(json!({ "activated": true })))
}
