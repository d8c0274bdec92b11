use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::checkout::{CardBatch, CardProvisionRequest, CustomerInfo};
use crate::domain::errors::CheckoutError;
use crate::domain::ports::CardGateway;

use super::transport_error;

/// REST client for the upstream card (ETag) service.
pub struct HttpCardGateway {
    client: Client,
    base_url: String,
}

impl HttpCardGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCardsBody {
    quantity: i32,
    etag_type_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCardsReply {
    etag_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateCardBody<'a> {
    full_name: &'a str,
    phone_number: &'a str,
    address: &'a str,
    gender: &'a str,
    national_id: &'a str,
}

#[async_trait]
impl CardGateway for HttpCardGateway {
    async fn generate_cards(
        &self,
        request: &CardProvisionRequest,
    ) -> Result<CardBatch, CheckoutError> {
        let body = GenerateCardsBody {
            quantity: request.quantity,
            etag_type_id: request.card_type_id,
            start_date: request.window.start_date,
            end_date: request.window.end_date,
        };
        let resp = self
            .client
            .post(format!("{}/etags/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("card provisioning", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckoutError::ProvisioningFailed(format!(
                "{}: {}",
                status, body
            )));
        }

        let reply: GenerateCardsReply = resp
            .json()
            .await
            .map_err(|e| transport_error("card provisioning", e))?;
        if reply.etag_ids.is_empty() {
            return Err(CheckoutError::ProvisioningFailed(
                "service returned no card ids".to_string(),
            ));
        }
        Ok(CardBatch {
            card_ids: reply.etag_ids,
        })
    }

    async fn activate_card(
        &self,
        card_id: &str,
        customer: &CustomerInfo,
    ) -> Result<(), CheckoutError> {
        let body = ActivateCardBody {
            full_name: &customer.full_name,
            phone_number: &customer.phone_number,
            address: &customer.address,
            gender: &customer.gender,
            national_id: &customer.national_id,
        };
        let resp = self
            .client
            .put(format!("{}/etags/{}/activate", self.base_url, card_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("card activation", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckoutError::ActivationFailed(format!(
                "{}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_body_uses_iso_dates_and_camel_case() {
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();
        let body = GenerateCardsBody {
            quantity: 2,
            etag_type_id: Uuid::nil(),
            start_date: d("2024-01-05"),
            end_date: d("2024-01-10"),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["etagTypeId"], Uuid::nil().to_string());
        assert_eq!(value["startDate"], "2024-01-05");
        assert_eq!(value["endDate"], "2024-01-10");
    }

    #[test]
    fn generate_reply_parses_ordered_ids() {
        let reply: GenerateCardsReply =
            serde_json::from_str(r#"{"etagIds":["e-1","e-2"]}"#).unwrap();
        assert_eq!(reply.etag_ids, vec!["e-1", "e-2"]);
    }
}
