//! Payment bridge.
//!
//! The lifecycle service talks to a [`PaymentGateway`] to open an order for an appointment and
//! to verify the signed callback the client returns after checkout. A callback signature is
//! `hex(HMAC-SHA256(key_secret, "<order_id>|<payment_id>"))`.
//!
//! Two gateways are provided:
//!
//! - [`RazorpayGateway`] calls the Razorpay Orders API over HTTPS.
//! - [`SandboxGateway`] keeps orders in memory and signs with a local secret. It is the default
//!   for development and is what the test suites use.

use crate::error::{BookingError, BookingResult};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// An order opened with a payment gateway. `amount` is in minor currency units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> BookingResult<PaymentOrder>;

    async fn fetch_order(&self, order_id: &str) -> BookingResult<PaymentOrder>;

    /// Checks a checkout callback signature.
    fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// Computes the callback signature for an order/payment pair.
pub fn sign_payment(secret: &[u8], order_id: &str, payment_id: &str) -> BookingResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| BookingError::PaymentGateway(format!("invalid signing key: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Domain label for deriving the sandbox signing key from another secret.
const SANDBOX_KEY_LABEL: &[u8] = b"docplus/sandbox-payment-key/v1";

/// Derives a payment signing key from `base`, distinct from any other use of `base`.
fn derive_sandbox_secret(base: &str) -> BookingResult<String> {
    let mut mac = HmacSha256::new_from_slice(base.as_bytes())
        .map_err(|e| BookingError::InvalidInput(format!("invalid base secret: {e}")))?;
    mac.update(SANDBOX_KEY_LABEL);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex callback signature.
pub fn verify_payment_signature(
    secret: &[u8],
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

// ============================================================================
// RAZORPAY
// ============================================================================

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay Orders API client.
pub struct RazorpayGateway {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
        }
    }

    async fn read_order(response: reqwest::Response) -> BookingResult<PaymentOrder> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BookingError::PaymentGateway(format!(
                "razorpay returned {status}: {body}"
            )));
        }

        response
            .json::<PaymentOrder>()
            .await
            .map_err(|e| BookingError::PaymentGateway(format!("unreadable razorpay order: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> BookingResult<PaymentOrder> {
        let response = self
            .http
            .post(RAZORPAY_ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| BookingError::PaymentGateway(e.to_string()))?;

        Self::read_order(response).await
    }

    async fn fetch_order(&self, order_id: &str) -> BookingResult<PaymentOrder> {
        let response = self
            .http
            .get(format!("{RAZORPAY_ORDERS_URL}/{order_id}"))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| BookingError::PaymentGateway(e.to_string()))?;

        Self::read_order(response).await
    }

    fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(self.key_secret.as_bytes(), order_id, payment_id, signature)
    }
}

// ============================================================================
// SANDBOX
// ============================================================================

/// Offline gateway holding orders in memory.
pub struct SandboxGateway {
    secret: Vec<u8>,
    orders: Mutex<HashMap<String, PaymentOrder>>,
}

impl SandboxGateway {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            orders: Mutex::new(HashMap::new()),
        }
    }

    fn random_id(prefix: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(14)
            .map(char::from)
            .collect();
        format!("{prefix}_{suffix}")
    }

    /// Signs an order/payment pair the way a completed checkout would.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> BookingResult<String> {
        sign_payment(&self.secret, order_id, payment_id)
    }

    /// Simulates a successful checkout, returning `(payment_id, signature)`.
    pub fn checkout(&self, order_id: &str) -> BookingResult<(String, String)> {
        let payment_id = Self::random_id("pay");
        let signature = self.sign(order_id, &payment_id)?;
        Ok((payment_id, signature))
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn name(&self) -> &'static str {
        "sandbox"
    }

    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> BookingResult<PaymentOrder> {
        let order = PaymentOrder {
            id: Self::random_id("order"),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        };

        self.orders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(order.id.clone(), order.clone());

        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> BookingResult<PaymentOrder> {
        self.orders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(order_id)
            .cloned()
            .ok_or_else(|| BookingError::PaymentGateway(format!("unknown order {order_id}")))
    }

    fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(&self.secret, order_id, payment_id, signature)
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which gateway to run, resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentSettings {
    Sandbox { secret: String },
    Razorpay { key_id: String, key_secret: String },
}

impl PaymentSettings {
    /// Resolves gateway settings from raw environment values.
    ///
    /// `gateway` defaults to `sandbox`. Without an explicit sandbox secret, one is derived from
    /// `fallback_secret` so the two never share a key.
    pub fn from_env_values(
        gateway: Option<String>,
        razorpay_key_id: Option<String>,
        razorpay_key_secret: Option<String>,
        sandbox_secret: Option<String>,
        fallback_secret: &str,
    ) -> BookingResult<Self> {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let gateway = non_blank(gateway).unwrap_or_else(|| "sandbox".into());
        match gateway.to_ascii_lowercase().as_str() {
            "sandbox" => {
                let secret = match non_blank(sandbox_secret) {
                    Some(secret) => secret,
                    None => derive_sandbox_secret(fallback_secret)?,
                };
                Ok(PaymentSettings::Sandbox { secret })
            }
            "razorpay" => {
                let key_id = non_blank(razorpay_key_id).ok_or_else(|| {
                    BookingError::InvalidInput("RAZORPAY_KEY_ID is required for razorpay".into())
                })?;
                let key_secret = non_blank(razorpay_key_secret).ok_or_else(|| {
                    BookingError::InvalidInput(
                        "RAZORPAY_KEY_SECRET is required for razorpay".into(),
                    )
                })?;
                Ok(PaymentSettings::Razorpay { key_id, key_secret })
            }
            other => Err(BookingError::InvalidInput(format!(
                "unknown payment gateway '{other}' (expected sandbox or razorpay)"
            ))),
        }
    }

    pub fn build(self) -> Arc<dyn PaymentGateway> {
        match self {
            PaymentSettings::Sandbox { secret } => Arc::new(SandboxGateway::new(secret)),
            PaymentSettings::Razorpay { key_id, key_secret } => {
                Arc::new(RazorpayGateway::new(key_id, key_secret))
            }
        }
    }
}
