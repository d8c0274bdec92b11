use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub gender: String,
    pub national_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub quantity: i32,
}

/// An uncommitted purchase record, sent to the order service to reserve
/// pricing and line items before payment/activation completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOrder {
    pub sale_type: String,
    pub payment_method: PaymentMethod,
    pub total_amount: BigDecimal,
    pub lines: Vec<OrderLine>,
    pub customer: CustomerInfo,
}

impl DraftOrder {
    /// The total is always recomputed from the lines, never taken from the
    /// client.
    pub fn new(
        sale_type: String,
        payment_method: PaymentMethod,
        lines: Vec<OrderLine>,
        customer: CustomerInfo,
    ) -> Self {
        let total_amount = lines.iter().fold(BigDecimal::from(0), |acc, l| {
            acc + &l.price * BigDecimal::from(l.quantity)
        });
        Self {
            sale_type,
            payment_method,
            total_amount,
            lines,
            customer,
        }
    }
}

/// Identifiers returned by the order service for a created draft order.
/// These are the only pieces of the draft the workflow holds on to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub invoice_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ActivationWindow {
    /// The window must start strictly before it ends; a same-day or reversed
    /// window is never sent upstream.
    pub fn is_valid(&self) -> bool {
        self.start_date < self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardProvisionRequest {
    pub quantity: i32,
    pub card_type_id: Uuid,
    pub window: ActivationWindow,
}

/// Ordered, non-empty list of provisioned card ids. The first id is the
/// primary card. A batch is only meaningful for the draft order it was
/// provisioned against and is never reused across orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardBatch {
    pub card_ids: Vec<String>,
}

impl CardBatch {
    pub fn primary(&self) -> Option<&str> {
        self.card_ids.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Momo,
    VnPay,
    PayOs,
    ZaloPay,
}

impl PaymentMethod {
    /// Case-insensitive parse of the wire value. Unknown values are a
    /// configuration error, reported distinctly from provider failures.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "momo" => Some(Self::Momo),
            "vnpay" => Some(Self::VnPay),
            "payos" => Some(Self::PayOs),
            "zalopay" => Some(Self::ZaloPay),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Momo => "momo",
            Self::VnPay => "vnpay",
            Self::PayOs => "payos",
            Self::ZaloPay => "zalopay",
        }
    }

    /// The external provider behind this method, or `None` for cash, which
    /// completes locally and never reaches the payment gateway.
    pub fn provider(self) -> Option<PaymentProvider> {
        match self {
            Self::Cash => None,
            Self::Momo => Some(PaymentProvider::Momo),
            Self::VnPay => Some(PaymentProvider::VnPay),
            Self::PayOs => Some(PaymentProvider::PayOs),
            Self::ZaloPay => Some(PaymentProvider::ZaloPay),
        }
    }
}

/// The four redirect-based providers. Cash is deliberately not representable
/// here so the payment gateway cannot be invoked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Momo,
    VnPay,
    PayOs,
    ZaloPay,
}

impl PaymentProvider {
    pub fn name(self) -> &'static str {
        match self {
            Self::Momo => "momo",
            Self::VnPay => "vnpay",
            Self::PayOs => "payos",
            Self::ZaloPay => "zalopay",
        }
    }
}

/// Strict progression gate over the checkout steps. Process state only:
/// resets to all-false on cancel and is consumed by successful completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationState {
    pub customer_info: bool,
    pub card_info: bool,
    pub cash_payment: bool,
    pub order: bool,
}

/// Operator input for the customer/order step. The payment method arrives as
/// the raw wire string and is parsed by the orchestrator.
#[derive(Debug, Clone)]
pub struct CustomerInfoForm {
    pub sale_type: String,
    pub payment_method: String,
    pub card_type_id: Uuid,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
}

/// Operator input for the card activation window step.
#[derive(Debug, Clone, Copy)]
pub struct CardInfoForm {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i32,
}

/// The explicit per-checkout context object. All state the workflow caches
/// between steps lives here; nothing is ambient. The session is persisted as
/// a crash-recovery cache and deleted on cancel or successful cash
/// completion; abandoned sessions are reaped by the startup sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub sale_type: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub customer: Option<CustomerInfo>,
    pub lines: Vec<OrderLine>,
    pub card_type_id: Option<Uuid>,
    pub order: Option<OrderReceipt>,
    pub card_window: Option<ActivationWindow>,
    pub card_quantity: Option<i32>,
    pub card_batch: Option<CardBatch>,
    pub confirmation: ConfirmationState,
}

impl CheckoutSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            sale_type: None,
            payment_method: None,
            customer: None,
            lines: Vec::new(),
            card_type_id: None,
            order: None,
            card_window: None,
            card_quantity: None,
            card_batch: None,
            confirmation: ConfirmationState::default(),
        }
    }

    /// Total number of purchased units across all lines. One card is
    /// provisioned per unit.
    pub fn ordered_units(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Back to a blank session: all flags false, all cached identifiers and
    /// stored form data cleared. Only the id survives.
    pub fn reset(&mut self) {
        *self = Self::new(self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn line(price: &str, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            name: "City pass".to_string(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
            image_url: None,
            quantity,
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Nguyen Van A".to_string(),
            phone_number: "0900000001".to_string(),
            address: "1 Le Loi".to_string(),
            gender: "male".to_string(),
            national_id: "079123456789".to_string(),
        }
    }

    #[test]
    fn draft_order_recomputes_total_from_lines() {
        let draft = DraftOrder::new(
            "package".to_string(),
            PaymentMethod::Cash,
            vec![line("100000", 2), line("50000", 1)],
            customer(),
        );
        assert_eq!(draft.total_amount, BigDecimal::from(250000));
    }

    #[test]
    fn payment_method_parse_is_case_insensitive() {
        assert_eq!(PaymentMethod::parse("MoMo"), Some(PaymentMethod::Momo));
        assert_eq!(PaymentMethod::parse(" CASH "), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("ZaloPay"), Some(PaymentMethod::ZaloPay));
        assert_eq!(PaymentMethod::parse("paypal"), None);
        assert_eq!(PaymentMethod::parse(""), None);
    }

    #[test]
    fn cash_has_no_provider() {
        assert_eq!(PaymentMethod::Cash.provider(), None);
        assert_eq!(
            PaymentMethod::VnPay.provider(),
            Some(PaymentProvider::VnPay)
        );
    }

    #[test]
    fn activation_window_must_be_strictly_increasing() {
        let d = |s| NaiveDate::from_str(s).expect("valid date");
        let reversed = ActivationWindow {
            start_date: d("2024-01-10"),
            end_date: d("2024-01-05"),
        };
        let same_day = ActivationWindow {
            start_date: d("2024-01-10"),
            end_date: d("2024-01-10"),
        };
        let ok = ActivationWindow {
            start_date: d("2024-01-05"),
            end_date: d("2024-01-10"),
        };
        assert!(!reversed.is_valid());
        assert!(!same_day.is_valid());
        assert!(ok.is_valid());
    }

    #[test]
    fn session_reset_clears_everything_but_the_id() {
        let id = Uuid::new_v4();
        let mut session = CheckoutSession::new(id);
        session.lines = vec![line("100000", 2)];
        session.customer = Some(customer());
        session.card_type_id = Some(Uuid::new_v4());
        session.order = Some(OrderReceipt {
            order_id: "o1".to_string(),
            invoice_id: "i1".to_string(),
        });
        session.card_batch = Some(CardBatch {
            card_ids: vec!["c1".to_string()],
        });
        session.confirmation.customer_info = true;
        session.confirmation.card_info = true;

        session.reset();

        assert_eq!(session, CheckoutSession::new(id));
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut session = CheckoutSession::new(Uuid::new_v4());
        session.payment_method = Some(PaymentMethod::PayOs);
        session.lines = vec![line("100000", 2)];
        session.order = Some(OrderReceipt {
            order_id: "o1".to_string(),
            invoice_id: "i1".to_string(),
        });
        session.confirmation.customer_info = true;

        let value = serde_json::to_value(&session).expect("serialize");
        let back: CheckoutSession = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, session);
    }
}
