//! Mock payment gateway for tests and local development.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::ports::{GatewayError, GatewayEventKind, GatewayOrder, ParsedEvent, PaymentGateway};

use super::to_minor_units;

type HmacSha256 = Hmac<Sha256>;

const MOCK_WEBHOOK_SECRET: &str = "mock_webhook_secret";

/// In-memory gateway that records every call.
///
/// Orders get sequential ids (`order_mock_1`, `order_mock_2`, ...). Webhook
/// verification uses a fixed secret; [`MockGateway::sign`] produces a valid
/// signature for a payload.
pub struct MockGateway {
    next_order: AtomicU64,
    fail_orders: AtomicBool,
    created_orders: Mutex<Vec<GatewayOrder>>,
    cancelled_subscriptions: Mutex<Vec<String>>,
    captured_payments: Mutex<Vec<String>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_order: AtomicU64::new(1),
            fail_orders: AtomicBool::new(false),
            created_orders: Mutex::new(Vec::new()),
            cancelled_subscriptions: Mutex::new(Vec::new()),
            captured_payments: Mutex::new(Vec::new()),
        }
    }

    /// Make subsequent `create_order` calls fail with a network error.
    pub fn fail_next_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn created_orders(&self) -> Vec<GatewayOrder> {
        self.created_orders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn cancelled_subscriptions(&self) -> Vec<String> {
        self.cancelled_subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn captured_payments(&self) -> Vec<String> {
        self.captured_payments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sign a payload the way the mock's verification expects.
    pub fn sign(payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(MOCK_WEBHOOK_SECRET.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount_major: f64,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("mock gateway unavailable".into()));
        }
        let n = self.next_order.fetch_add(1, Ordering::SeqCst);
        let order = GatewayOrder {
            id: format!("order_mock_{}", n),
            amount_minor: to_minor_units(amount_major),
            currency: currency.to_string(),
            status: "created".to_string(),
        };
        self.created_orders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(order.clone());
        Ok(order)
    }

    async fn construct_event(
        &self,
        raw_payload: &[u8],
        signature_header: &str,
    ) -> Result<ParsedEvent, GatewayError> {
        if Self::sign(raw_payload) != signature_header {
            return Err(GatewayError::InvalidSignature);
        }
        let value: serde_json::Value =
            serde_json::from_slice(raw_payload).map_err(|e| GatewayError::Parse(e.to_string()))?;
        let kind = match value["event"].as_str() {
            Some("payment.captured") => GatewayEventKind::PaymentCaptured,
            Some("payment.failed") => GatewayEventKind::PaymentFailed,
            Some(other) => GatewayEventKind::Unknown(other.to_string()),
            None => return Err(GatewayError::Parse("missing event field".into())),
        };
        let entity = &value["payload"]["payment"]["entity"];
        Ok(ParsedEvent {
            kind,
            gateway_order_id: entity["order_id"].as_str().map(String::from),
            gateway_payment_id: entity["id"].as_str().map(String::from),
            error_description: entity["error_description"].as_str().map(String::from),
            payload: value,
        })
    }

    async fn capture_payment(
        &self,
        gateway_payment_id: &str,
        _amount_major: f64,
        _currency: &str,
    ) -> Result<(), GatewayError> {
        self.captured_payments
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(gateway_payment_id.to_string());
        Ok(())
    }

    async fn cancel_subscription(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<(), GatewayError> {
        self.cancelled_subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(gateway_subscription_id.to_string());
        Ok(())
    }

    async fn update_subscription(
        &self,
        _gateway_subscription_id: &str,
        _gateway_plan_id: &str,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn orders_get_sequential_ids_and_minor_amounts() {
        let gateway = MockGateway::new();
        let first = gateway.create_order(999.0, "INR", "rcpt_1").await.unwrap();
        let second = gateway.create_order(499.5, "INR", "rcpt_2").await.unwrap();

        assert_eq!(first.id, "order_mock_1");
        assert_eq!(second.id, "order_mock_2");
        assert_eq!(first.amount_minor, 99_900);
        assert_eq!(second.amount_minor, 49_950);
        assert_eq!(gateway.created_orders().len(), 2);
    }

    #[tokio::test]
    async fn failing_mode_returns_network_error() {
        let gateway = MockGateway::new();
        gateway.fail_next_orders(true);

        let result = gateway.create_order(100.0, "INR", "rcpt").await;
        assert!(matches!(result, Err(GatewayError::Network(_))));
    }

    #[tokio::test]
    async fn construct_event_round_trips_signed_payload() {
        let gateway = MockGateway::new();
        let payload = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","order_id":"order_mock_1"}}}}"#;
        let signature = MockGateway::sign(payload);

        let event = gateway.construct_event(payload, &signature).await.unwrap();
        assert_eq!(event.kind, GatewayEventKind::PaymentCaptured);
        assert_eq!(event.gateway_order_id.as_deref(), Some("order_mock_1"));

        let rejected = gateway.construct_event(payload, "bogus").await;
        assert!(matches!(rejected, Err(GatewayError::InvalidSignature)));
    }
}
