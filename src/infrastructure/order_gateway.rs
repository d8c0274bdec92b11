use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::checkout::{DraftOrder, OrderReceipt};
use crate::domain::errors::CheckoutError;
use crate::domain::ports::OrderGateway;

use super::transport_error;

/// REST client for the upstream order service.
pub struct HttpOrderGateway {
    client: Client,
    base_url: String,
}

impl HttpOrderGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

// ── Wire DTOs (order service speaks camelCase) ───────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody<'a> {
    sale_type: &'a str,
    payment_type: &'a str,
    /// Decimal amount as a string to avoid floating-point issues.
    total_amount: String,
    lines: Vec<OrderLineBody<'a>>,
    customer: CustomerBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderLineBody<'a> {
    product_id: Uuid,
    name: &'a str,
    price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomerBody<'a> {
    full_name: &'a str,
    phone_number: &'a str,
    address: &'a str,
    gender: &'a str,
    national_id: &'a str,
}

impl<'a> From<&'a DraftOrder> for CreateOrderBody<'a> {
    fn from(draft: &'a DraftOrder) -> Self {
        Self {
            sale_type: &draft.sale_type,
            payment_type: draft.payment_method.as_str(),
            total_amount: draft.total_amount.to_string(),
            lines: draft
                .lines
                .iter()
                .map(|l| OrderLineBody {
                    product_id: l.product_id,
                    name: &l.name,
                    price: l.price.to_string(),
                    image_url: l.image_url.as_deref(),
                    quantity: l.quantity,
                })
                .collect(),
            customer: CustomerBody {
                full_name: &draft.customer.full_name,
                phone_number: &draft.customer.phone_number,
                address: &draft.customer.address,
                gender: &draft.customer.gender,
                national_id: &draft.customer.national_id,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderReply {
    order_id: String,
    invoice_id: String,
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn create_order(&self, draft: &DraftOrder) -> Result<OrderReceipt, CheckoutError> {
        let resp = self
            .client
            .post(format!("{}/orders", self.base_url))
            .json(&CreateOrderBody::from(draft))
            .send()
            .await
            .map_err(|e| transport_error("order creation", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckoutError::OrderRejected(format!("{}: {}", status, body)));
        }

        let reply: CreateOrderReply = resp
            .json()
            .await
            .map_err(|e| transport_error("order creation", e))?;
        Ok(OrderReceipt {
            order_id: reply.order_id,
            invoice_id: reply.invoice_id,
        })
    }

    async fn delete_order(&self, order_id: &str) -> Result<(), CheckoutError> {
        let resp = self
            .client
            .delete(format!("{}/orders/{}", self.base_url, order_id))
            .send()
            .await
            .map_err(|e| transport_error("order deletion", e))?;

        let status = resp.status();
        // An order that is already gone counts as deleted.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CheckoutError::Gateway(format!(
            "order deletion: {}: {}",
            status, body
        )))
    }
}
