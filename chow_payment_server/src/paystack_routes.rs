//----------------------------------------------   Webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use chow_payment_engine::{
    helpers::PAYSTACK_SIGNATURE_HEADER,
    traits::{FundingOutcome, LedgerManagement, PaymentGatewayClient},
    WalletApi,
};
use log::*;

use crate::{config::ServerOptions, data_objects::JsonResponse, errors::ServerError, helpers::get_remote_ip, route};

route!(paystack_webhook => Post "/webhook" impl LedgerManagement, PaymentGatewayClient);
/// Route handler for Paystack event notifications.
///
/// The body is taken as raw bytes, because the `x-paystack-signature` header is an HMAC over exactly what Paystack
/// sent. Anything that fails the signature check is rejected before it is parsed.
///
/// Replays of an event we've already applied get a 200, so that Paystack stops retrying.
pub async fn paystack_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<WalletApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerManagement,
    G: PaymentGatewayClient,
{
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    trace!("💰️ Received Paystack webhook from {peer:?}: {} bytes", body.len());
    let signature = req.headers().get(PAYSTACK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = api.apply_gateway_event(&body, signature).await.map_err(|e| {
        info!("💰️ Paystack webhook was not applied. {e}");
        ServerError::from(e)
    })?;
    let message = match &outcome {
        FundingOutcome::Credited { transaction, wallet } => {
            format!("Transaction {} completed. Wallet balance is {}", transaction.id, wallet.balance)
        },
        FundingOutcome::Failed { transaction } => format!("Transaction {} failed", transaction.id),
        FundingOutcome::Unchanged { transaction } => {
            format!("Transaction {} was already {}", transaction.id, transaction.status)
        },
    };
    debug!("💰️ {message}");
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}
