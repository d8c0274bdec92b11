use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::PaymentProvider;
use crate::domain::errors::CheckoutError;
use crate::domain::ports::PaymentGateway;

use super::transport_error;

/// REST client for the payment service. Each provider has its own initiation
/// endpoint and its own response shape; one normalizing rule per provider
/// reduces every response to a single redirect URL, so the dispatch itself
/// carries no field-name knowledge.
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, provider: PaymentProvider) -> String {
        format!("{}/payments/{}", self.base_url, provider.name())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateBody<'a> {
    invoice_id: &'a str,
}

fn non_empty(url: Option<String>) -> Option<String> {
    url.filter(|u| !u.is_empty())
}

/// Momo responds with either a web pay URL or an app deeplink; the web URL
/// wins when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MomoReply {
    pay_url: Option<String>,
    deeplink: Option<String>,
}

impl MomoReply {
    fn redirect_url(self) -> Option<String> {
        non_empty(self.pay_url).or_else(|| non_empty(self.deeplink))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VnPayReply {
    payment_url: Option<String>,
}

impl VnPayReply {
    fn redirect_url(self) -> Option<String> {
        non_empty(self.payment_url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayOsReply {
    checkout_url: Option<String>,
}

impl PayOsReply {
    fn redirect_url(self) -> Option<String> {
        non_empty(self.checkout_url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZaloPayReply {
    order_url: Option<String>,
}

impl ZaloPayReply {
    fn redirect_url(self) -> Option<String> {
        non_empty(self.order_url)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initiate(
        &self,
        provider: PaymentProvider,
        invoice_id: &str,
    ) -> Result<String, CheckoutError> {
        let resp = self
            .client
            .post(self.endpoint(provider))
            .json(&InitiateBody { invoice_id })
            .send()
            .await
            .map_err(|e| transport_error("payment initiation", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckoutError::PaymentInitiationFailed {
                provider: provider.name(),
                reason: format!("{}: {}", status, body),
            });
        }

        let redirect = match provider {
            PaymentProvider::Momo => resp
                .json::<MomoReply>()
                .await
                .map_err(|e| transport_error("payment initiation", e))?
                .redirect_url(),
            PaymentProvider::VnPay => resp
                .json::<VnPayReply>()
                .await
                .map_err(|e| transport_error("payment initiation", e))?
                .redirect_url(),
            PaymentProvider::PayOs => resp
                .json::<PayOsReply>()
                .await
                .map_err(|e| transport_error("payment initiation", e))?
                .redirect_url(),
            PaymentProvider::ZaloPay => resp
                .json::<ZaloPayReply>()
                .await
                .map_err(|e| transport_error("payment initiation", e))?
                .redirect_url(),
        };

        redirect.ok_or_else(|| CheckoutError::PaymentInitiationFailed {
            provider: provider.name(),
            reason: "response contained no redirect url".to_string(),
        })
    }
}
