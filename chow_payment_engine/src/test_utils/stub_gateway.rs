//! An in-memory [`PaymentGatewayClient`] for tests.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    db_types::Naira,
    traits::{
        GatewayClientError,
        GatewayPaymentRequest,
        GatewayPaymentStatus,
        GatewaySession,
        GatewayVerification,
        PaymentGatewayClient,
    },
};

#[derive(Debug, Clone)]
struct StubCharge {
    transaction_id: i64,
    amount: Naira,
    status: GatewayPaymentStatus,
}

/// Hands out references of the form `stub-<transaction id>` and remembers every checkout it opened.
#[derive(Debug, Clone, Default)]
pub struct StubGateway {
    charges: Arc<Mutex<HashMap<String, StubCharge>>>,
    offline: Arc<Mutex<bool>>,
}

impl StubGateway {
    pub fn reference_for(transaction_id: i64) -> String {
        format!("stub-{transaction_id}")
    }

    /// While offline, every call fails with [`GatewayClientError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().expect("poisoned") = offline;
    }

    /// Sets what a later verification of `reference` will report.
    pub fn set_outcome(&self, reference: &str, status: GatewayPaymentStatus) {
        if let Some(charge) = self.charges.lock().expect("poisoned").get_mut(reference) {
            charge.status = status;
        }
    }

    pub fn checkouts(&self) -> usize {
        self.charges.lock().expect("poisoned").len()
    }

    fn check_online(&self) -> Result<(), GatewayClientError> {
        if *self.offline.lock().expect("poisoned") {
            Err(GatewayClientError::Unavailable("stub gateway is offline".into()))
        } else {
            Ok(())
        }
    }
}

impl PaymentGatewayClient for StubGateway {
    async fn initialize_payment(&self, request: GatewayPaymentRequest) -> Result<GatewaySession, GatewayClientError> {
        self.check_online()?;
        let reference = Self::reference_for(request.transaction_id);
        let charge = StubCharge {
            transaction_id: request.transaction_id,
            amount: request.amount,
            status: GatewayPaymentStatus::Pending,
        };
        self.charges.lock().expect("poisoned").insert(reference.clone(), charge);
        Ok(GatewaySession {
            authorization_url: format!("https://checkout.example.test/{reference}"),
            access_code: Some(format!("ac-{}", request.transaction_id)),
            reference,
        })
    }

    async fn verify_payment(&self, reference: &str) -> Result<GatewayVerification, GatewayClientError> {
        self.check_online()?;
        let charges = self.charges.lock().expect("poisoned");
        let charge =
            charges.get(reference).ok_or_else(|| GatewayClientError::Rejected(format!("Unknown reference {reference}")))?;
        Ok(GatewayVerification {
            reference: reference.to_string(),
            status: charge.status,
            amount: charge.amount,
            transaction_id: Some(charge.transaction_id),
        })
    }
}
