use chrono::Duration;
use chow_payment_engine::{db_types::Transaction, SqliteDatabase, WalletApi};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::paystack::PaystackGateway;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Pending funding transactions that Paystack never reported on are failed once they are older than `timeout`, so
/// nothing is left pending forever.
pub fn start_expiry_worker(
    api: WalletApi<SqliteDatabase, PaystackGateway>,
    timeout: Duration,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Pending funding expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running pending funding expiry job");
            match api.expire_pending_funding(timeout).await {
                Ok(expired) if expired.is_empty() => {
                    trace!("🕰️ No pending funding transactions expired");
                },
                Ok(expired) => {
                    info!("🕰️ {} pending funding transactions expired", expired.len());
                    debug!("🕰️ Expired transactions: {}", transaction_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running pending funding expiry job: {e}");
                },
            }
        }
    })
}

fn transaction_list(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .map(|t| format!("[{}] {} {}", t.id, t.owner(), t.amount))
        .collect::<Vec<String>>()
        .join(", ")
}
