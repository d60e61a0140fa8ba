//! Integration tests for the subscription purchase and settlement flow.
//!
//! These tests run the full path without external dependencies:
//! 1. CreateSubscriptionHandler opens a Pending subscription, payment, and
//!    gateway order
//! 2. Settlement arrives either as a signed client confirmation or as a
//!    signed gateway webhook
//! 3. Whichever path lands first settles; the other becomes a no-op
//! 4. Entitlement checks observe the outcome
//!
//! Uses the in-memory stores and the mock gateway.

use std::sync::Arc;

use secrecy::SecretString;

use tenant_ledger::adapters::cache::NoopCacheInvalidator;
use tenant_ledger::adapters::memory::MemoryLedger;
use tenant_ledger::adapters::razorpay::MockGateway;
use tenant_ledger::application::handlers::settlement::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandlePaymentFailureHandler,
    HandlePaymentSuccessCommand, HandlePaymentSuccessHandler, WebhookOutcome,
};
use tenant_ledger::application::handlers::subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CheckAccessHandler, CheckAccessQuery,
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
use tenant_ledger::domain::foundation::{ErrorCode, TenantId};
use tenant_ledger::domain::payment::{compute_payment_signature, PaymentStatus};
use tenant_ledger::domain::subscription::{BillingCycle, Plan, SubscriptionStatus};
use tenant_ledger::ports::PlanRepository;

const KEY_SECRET: &str = "rzp_secret_integration";

struct World {
    ledger: Arc<MemoryLedger>,
    create: CreateSubscriptionHandler,
    success: Arc<HandlePaymentSuccessHandler>,
    webhook: HandleGatewayWebhookHandler,
    cancel: CancelSubscriptionHandler,
    access: CheckAccessHandler,
    plan: Plan,
}

async fn world() -> World {
    let ledger = Arc::new(MemoryLedger::new());
    let gateway = Arc::new(MockGateway::new());
    let cache = Arc::new(NoopCacheInvalidator);

    let plan = Plan::new("Growth", 1_999.0, "INR", 30, BillingCycle::Monthly).unwrap();
    ledger.save(&plan).await.unwrap();

    let create = CreateSubscriptionHandler::new(
        ledger.clone(),
        ledger.clone(),
        ledger.clone(),
        gateway.clone(),
        cache.clone(),
    );
    let success = Arc::new(HandlePaymentSuccessHandler::new(
        ledger.clone(),
        ledger.clone(),
        cache.clone(),
        SecretString::new(KEY_SECRET.to_string()),
    ));
    let failure = Arc::new(HandlePaymentFailureHandler::new(
        ledger.clone(),
        cache.clone(),
    ));
    let webhook = HandleGatewayWebhookHandler::new(
        gateway,
        ledger.clone(),
        success.clone(),
        failure,
    );
    let cancel = CancelSubscriptionHandler::new(ledger.clone(), cache);
    let access = CheckAccessHandler::new(ledger.clone());

    World {
        ledger,
        create,
        success,
        webhook,
        cancel,
        access,
        plan,
    }
}

async fn purchase(w: &World, tenant_id: TenantId) -> CreateSubscriptionResult {
    w.create
        .handle(CreateSubscriptionCommand {
            tenant_id,
            plan_id: w.plan.id,
        })
        .await
        .unwrap()
}

fn client_confirmation(
    purchase: &CreateSubscriptionResult,
    gateway_payment_id: &str,
) -> HandlePaymentSuccessCommand {
    let order_id = purchase.gateway_order.id.clone();
    HandlePaymentSuccessCommand {
        payment_id: purchase.payment.id,
        signature: compute_payment_signature(KEY_SECRET, &order_id, gateway_payment_id),
        gateway_order_id: order_id,
        gateway_payment_id: gateway_payment_id.to_string(),
    }
}

fn capture_webhook(order_id: &str) -> HandleGatewayWebhookCommand {
    let body = serde_json::to_vec(&serde_json::json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": { "id": "pay_hook", "order_id": order_id }
            }
        }
    }))
    .unwrap();
    HandleGatewayWebhookCommand {
        signature_header: MockGateway::sign(&body),
        raw_payload: body,
    }
}

fn failure_webhook(order_id: &str) -> HandleGatewayWebhookCommand {
    let body = serde_json::to_vec(&serde_json::json!({
        "event": "payment.failed",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_hook",
                    "order_id": order_id,
                    "error_description": "insufficient funds"
                }
            }
        }
    }))
    .unwrap();
    HandleGatewayWebhookCommand {
        signature_header: MockGateway::sign(&body),
        raw_payload: body,
    }
}

#[tokio::test]
async fn purchase_then_client_confirmation_grants_access() {
    let w = world().await;
    let tenant_id = TenantId::new();

    let purchase = purchase(&w, tenant_id).await;
    assert_eq!(purchase.subscription.status, SubscriptionStatus::Pending);
    assert_eq!(purchase.payment.amount, 1_999.0);
    // The gateway sees minor units.
    assert_eq!(purchase.gateway_order.amount_minor, 199_900);

    // Pending grants nothing yet.
    let before = w.access.handle(CheckAccessQuery { tenant_id }).await.unwrap();
    assert!(!before.has_access);

    let settled = w
        .success
        .handle(client_confirmation(&purchase, "pay_client_1"))
        .await
        .unwrap();
    assert!(settled.applied);
    assert_eq!(settled.payment.status, PaymentStatus::Completed);

    let after = w.access.handle(CheckAccessQuery { tenant_id }).await.unwrap();
    assert!(after.has_access);
    assert_eq!(after.status, Some(SubscriptionStatus::Active));
}

#[tokio::test]
async fn renewal_extends_from_the_current_period_end() {
    let w = world().await;
    let tenant_id = TenantId::new();

    let first = purchase(&w, tenant_id).await;
    w.success
        .handle(client_confirmation(&first, "pay_1"))
        .await
        .unwrap();

    let active = w
        .access
        .handle(CheckAccessQuery { tenant_id })
        .await
        .unwrap()
        .subscription
        .unwrap();

    // Buying again while entitled starts the new period at the current end.
    let renewal = purchase(&w, tenant_id).await;
    assert_eq!(renewal.subscription.start_date, active.end_date);
    assert_eq!(
        renewal.subscription.end_date,
        active.end_date.add_days(w.plan.validity_days)
    );
}

#[tokio::test]
async fn webhook_after_client_confirmation_is_a_no_op() {
    let w = world().await;
    let tenant_id = TenantId::new();

    let purchase = purchase(&w, tenant_id).await;
    w.success
        .handle(client_confirmation(&purchase, "pay_first"))
        .await
        .unwrap();

    let outcome = w
        .webhook
        .handle(capture_webhook(&purchase.gateway_order.id))
        .await
        .unwrap();

    match outcome {
        WebhookOutcome::Settled(result) => {
            assert!(!result.applied);
            // The first settlement's capture id stands.
            assert_eq!(
                result.payment.gateway_payment_id.as_deref(),
                Some("pay_first")
            );
        }
        other => panic!("expected Settled, got {:?}", other),
    }
}

#[tokio::test]
async fn tampered_confirmation_is_rejected_but_webhook_still_settles() {
    let w = world().await;
    let tenant_id = TenantId::new();
    let purchase = purchase(&w, tenant_id).await;

    let mut forged = client_confirmation(&purchase, "pay_x");
    forged.signature = compute_payment_signature("wrong_secret", &forged.gateway_order_id, "pay_x");
    let rejected = w.success.handle(forged).await;
    assert_eq!(rejected.unwrap_err().code, ErrorCode::InvalidSignature);

    let outcome = w
        .webhook
        .handle(capture_webhook(&purchase.gateway_order.id))
        .await
        .unwrap();
    match outcome {
        WebhookOutcome::Settled(result) => assert!(result.applied),
        other => panic!("expected Settled, got {:?}", other),
    }

    let status = w.access.handle(CheckAccessQuery { tenant_id }).await.unwrap();
    assert!(status.has_access);
}

#[tokio::test]
async fn failed_payment_webhook_cancels_the_pending_subscription() {
    let w = world().await;
    let tenant_id = TenantId::new();
    let purchase = purchase(&w, tenant_id).await;

    let outcome = w
        .webhook
        .handle(failure_webhook(&purchase.gateway_order.id))
        .await
        .unwrap();
    match outcome {
        WebhookOutcome::MarkedFailed(result) => {
            assert_eq!(result.payment.status, PaymentStatus::Failed);
            assert_eq!(
                result.payment.failure_reason.as_deref(),
                Some("insufficient funds")
            );
        }
        other => panic!("expected MarkedFailed, got {:?}", other),
    }

    let status = w.access.handle(CheckAccessQuery { tenant_id }).await.unwrap();
    assert!(!status.has_access);
    // Cancelled reads as Expired from the caller's view.
    assert_eq!(status.status, Some(SubscriptionStatus::Expired));
}

#[tokio::test]
async fn cancellation_ends_access_immediately() {
    let w = world().await;
    let tenant_id = TenantId::new();
    let purchase = purchase(&w, tenant_id).await;
    w.success
        .handle(client_confirmation(&purchase, "pay_1"))
        .await
        .unwrap();

    w.cancel
        .handle(CancelSubscriptionCommand {
            subscription_id: purchase.subscription.id,
        })
        .await
        .unwrap();

    let status = w.access.handle(CheckAccessQuery { tenant_id }).await.unwrap();
    assert!(!status.has_access);
    // Cancelled reads as Expired from the caller's view.
    assert_eq!(status.status, Some(SubscriptionStatus::Expired));

    // The ledger kept the payment record untouched by cancellation.
    let (payment, _) = tenant_ledger::ports::PaymentStore::find_with_subscription(
        w.ledger.as_ref(),
        &purchase.payment.id,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}
