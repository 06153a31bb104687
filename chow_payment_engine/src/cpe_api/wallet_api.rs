use std::fmt::Debug;

use chrono::Duration;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    cpe_api::{
        errors::WalletApiError,
        gateway_event::{ChargeData, GatewayEvent, GatewayEventKind},
    },
    db_types::{Naira, Principal, Transaction},
    events::{EventProducers, FundingFailedEvent, WalletFundedEvent},
    helpers::{retry_on_conflict, WebhookVerifier},
    traits::{
        FundingOutcome,
        GatewayPaymentRequest,
        GatewayPaymentStatus,
        LedgerError,
        LedgerManagement,
        PaymentGatewayClient,
    },
};

/// What the caller needs to send the payer to the gateway's hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSession {
    pub transaction: Transaction,
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// `WalletApi` reconciles wallet funding with the payment gateway.
///
/// Funding is a two-step affair: [`WalletApi::initialize_funding`] records a pending credit and opens a checkout, and
/// the gateway later reports the outcome through a webhook ([`WalletApi::apply_gateway_event`]). The pending
/// transaction's id travels to the gateway and back in the checkout metadata, and is the only key used to find the
/// transaction again. Applying an outcome is a compare-and-set on the transaction status, so a webhook that is
/// delivered twice, or races a manual verification, credits the wallet exactly once.
pub struct WalletApi<B, G> {
    db: B,
    gateway: G,
    verifier: WebhookVerifier,
    producers: EventProducers,
}

impl<B, G> Debug for WalletApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi")
    }
}

impl<B, G> WalletApi<B, G> {
    pub fn new(db: B, gateway: G, verifier: WebhookVerifier, producers: EventProducers) -> Self {
        Self { db, gateway, verifier, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> WalletApi<B, G>
where
    B: LedgerManagement,
    G: PaymentGatewayClient,
{
    /// Records a pending credit for `principal` and opens a hosted checkout for it.
    ///
    /// Nothing is sent to the gateway unless the amount is positive and the wallet exists. If the gateway call fails,
    /// the pending transaction is marked as failed straight away rather than left for the expiry worker.
    pub async fn initialize_funding(
        &self,
        principal: &Principal,
        email: &str,
        amount: Naira,
    ) -> Result<FundingSession, WalletApiError> {
        if !amount.is_positive() {
            return Err(WalletApiError::Validation(format!("Funding amount must be positive. Got {amount}")));
        }
        if email.trim().is_empty() {
            return Err(WalletApiError::Validation("An email address is required to open a checkout".to_string()));
        }
        let pending = retry_on_conflict("insert pending funding", || self.db.insert_pending_funding(principal, amount))
            .await?;
        debug!("💰️ Pending funding #{} of {amount} created for {principal}", pending.id);
        let request = GatewayPaymentRequest {
            email: email.to_string(),
            amount,
            principal: principal.clone(),
            transaction_id: pending.id,
        };
        let session = match self.gateway.initialize_payment(request).await {
            Ok(session) => session,
            Err(e) => {
                warn!("💰️ Could not open a checkout for funding #{}. {e}", pending.id);
                match self.db.fail_funding(pending.id).await {
                    Ok(FundingOutcome::Failed { transaction }) => {
                        self.producers.publish_funding_failed(FundingFailedEvent { transaction, expired: false }).await;
                    },
                    Ok(_) => {},
                    Err(e) => error!("💰️ Could not mark funding #{} as failed. {e}", pending.id),
                }
                return Err(e.into());
            },
        };
        let transaction = self.db.attach_reference(pending.id, &session.reference).await?;
        info!("💰️ Checkout opened for funding #{} with reference {}", transaction.id, session.reference);
        Ok(FundingSession {
            transaction,
            authorization_url: session.authorization_url,
            access_code: session.access_code,
            reference: session.reference,
        })
    }

    /// Verifies and applies a gateway webhook.
    ///
    /// `raw` must be the request body exactly as received. The signature is checked before anything is parsed.
    pub async fn apply_gateway_event(
        &self,
        raw: &[u8],
        signature: Option<&str>,
    ) -> Result<FundingOutcome, WalletApiError> {
        if let Err(e) = self.verifier.verify(raw, signature) {
            warn!("🔐️ Rejected a webhook with a bad signature. {e}");
            return Err(e.into());
        }
        let event = GatewayEvent::from_slice(raw)?;
        trace!("💰️ Verified webhook: {}", event.event);
        match event.classify()? {
            GatewayEventKind::ChargeSucceeded(data) => self.apply_charge_success(&data).await,
            GatewayEventKind::ChargeFailed(data) => self.apply_charge_failure(&data).await,
            GatewayEventKind::Unhandled(name) => {
                info!("💰️ Ignoring unhandled gateway event '{name}'");
                Err(WalletApiError::UnhandledEvent(name))
            },
        }
    }

    /// Loads the transaction named in the metadata and checks it belongs to the principal named there too.
    async fn correlated_transaction(&self, data: &ChargeData) -> Result<Transaction, WalletApiError> {
        let meta = data.metadata()?;
        let principal = meta.principal()?;
        let transaction = self
            .db
            .fetch_transaction(meta.transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(meta.transaction_id))?;
        if !transaction.is_owned_by(&principal) {
            return Err(WalletApiError::Validation(format!(
                "Transaction {} does not belong to {principal}",
                transaction.id
            )));
        }
        Ok(transaction)
    }

    async fn apply_charge_success(&self, data: &ChargeData) -> Result<FundingOutcome, WalletApiError> {
        let transaction = self.correlated_transaction(data).await?;
        let settled = data.settled_amount();
        if settled != transaction.amount {
            warn!(
                "💰️ Gateway settled {settled} for funding #{}, which was opened for {}. Crediting the settled amount.",
                transaction.id, transaction.amount
            );
        }
        let reference = data.reference.as_deref();
        let outcome =
            retry_on_conflict("complete funding", || self.db.complete_funding(transaction.id, settled, reference)).await;
        let outcome = match outcome {
            Err(e @ LedgerError::TransactionAlreadyFinalized { .. }) => {
                error!("💰️ Received a successful charge for funding #{} which had already failed. {e}", transaction.id);
                return Err(e.into());
            },
            other => other?,
        };
        self.publish_outcome(&outcome, false).await;
        Ok(outcome)
    }

    async fn apply_charge_failure(&self, data: &ChargeData) -> Result<FundingOutcome, WalletApiError> {
        let transaction = self.correlated_transaction(data).await?;
        let outcome = retry_on_conflict("fail funding", || self.db.fail_funding(transaction.id)).await?;
        self.publish_outcome(&outcome, false).await;
        Ok(outcome)
    }

    async fn publish_outcome(&self, outcome: &FundingOutcome, expired: bool) {
        match outcome {
            FundingOutcome::Credited { transaction, wallet } => {
                info!("💰️ Wallet {} funded with {}", wallet.owner(), transaction.amount);
                let event = WalletFundedEvent::new(transaction.clone(), wallet.clone());
                self.producers.publish_wallet_funded(event).await;
            },
            FundingOutcome::Failed { transaction } => {
                info!("💰️ Funding #{} for {} failed", transaction.id, transaction.owner());
                let event = FundingFailedEvent { transaction: transaction.clone(), expired };
                self.producers.publish_funding_failed(event).await;
            },
            FundingOutcome::Unchanged { transaction } => {
                debug!("💰️ Funding #{} is already {}. Nothing to do.", transaction.id, transaction.status);
            },
        }
    }

    /// Asks the gateway for the outcome of a funding transaction instead of waiting for the webhook.
    ///
    /// `requester` is `None` for administrators; otherwise the transaction must belong to the requester.
    pub async fn verify_funding(
        &self,
        transaction_id: i64,
        requester: Option<&Principal>,
    ) -> Result<FundingOutcome, WalletApiError> {
        let transaction =
            self.db.fetch_transaction(transaction_id).await?.ok_or(LedgerError::TransactionNotFound(transaction_id))?;
        if let Some(p) = requester {
            if !transaction.is_owned_by(p) {
                return Err(WalletApiError::Forbidden(format!("Transaction {transaction_id} does not belong to {p}")));
            }
        }
        if transaction.status.is_terminal() {
            return Ok(FundingOutcome::Unchanged { transaction });
        }
        let Some(reference) = transaction.reference.clone() else {
            return Err(WalletApiError::Validation(format!(
                "Transaction {transaction_id} has no gateway reference yet"
            )));
        };
        let verification = self.gateway.verify_payment(&reference).await?;
        if let Some(id) = verification.transaction_id {
            if id != transaction_id {
                return Err(WalletApiError::Validation(format!(
                    "Reference {reference} belongs to transaction {id}, not {transaction_id}"
                )));
            }
        }
        let outcome = match verification.status {
            GatewayPaymentStatus::Success => {
                retry_on_conflict("complete funding", || {
                    self.db.complete_funding(transaction_id, verification.amount, Some(&reference))
                })
                .await?
            },
            GatewayPaymentStatus::Failed => {
                retry_on_conflict("fail funding", || self.db.fail_funding(transaction_id)).await?
            },
            GatewayPaymentStatus::Pending => FundingOutcome::Unchanged { transaction },
        };
        self.publish_outcome(&outcome, false).await;
        Ok(outcome)
    }

    /// Fails pending funding transactions that are older than `window`. Returns the expired transactions.
    pub async fn expire_pending_funding(&self, window: Duration) -> Result<Vec<Transaction>, WalletApiError> {
        let expired = self.db.expire_pending_funding(window).await?;
        for transaction in &expired {
            self.publish_outcome(&FundingOutcome::Failed { transaction: transaction.clone() }, true).await;
        }
        Ok(expired)
    }
}
