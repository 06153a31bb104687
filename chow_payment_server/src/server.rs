use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use chow_payment_engine::{
    events::EventProducers,
    helpers::WebhookVerifier,
    AccountApi,
    OrderFlowApi,
    SqliteDatabase,
    WalletApi,
};
use futures::future::{ok, FutureExt};
use log::*;

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::{AuthError, ServerError, ServerError::AuthenticationError},
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip,
    integrations::{notifications::create_notification_event_handlers, paystack::PaystackGateway},
    middleware::JwtAuthFactory,
    paystack_routes::PaystackWebhookRoute,
    routes::{
        health,
        AcceptPickupRoute,
        AvailableOrdersRoute,
        CheckTokenRoute,
        ConfirmDeliveryRoute,
        CreateWalletRoute,
        FundWalletRoute,
        MarkDeliveredRoute,
        MyOrdersRoute,
        MyTransactionsRoute,
        MyWalletRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        RespondToOrderRoute,
        SetAvailabilityRoute,
        SettleRiderRoute,
        SettleVendorRoute,
        TransactionByIdRoute,
        VerifyFundingRoute,
        WalletForPrincipalRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    info!("🚀️ Database is ready at {}", db.url());
    let gateway =
        PaystackGateway::new(config.paystack.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let verifier = WebhookVerifier::new(config.paystack.secret_key.clone());
    let expiry_api = WalletApi::new(db.clone(), gateway.clone(), verifier, producers.clone());
    let _worker = start_expiry_worker(expiry_api, config.pending_funding_timeout, config.expiry_check_interval);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let accounts_api = AccountApi::new(db.clone());
        let verifier = WebhookVerifier::new(config.paystack.secret_key.clone());
        let wallet_api = WalletApi::new(db.clone(), gateway.clone(), verifier, producers.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cps::access_log"))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(wallet_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(options));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtAuthFactory::new(TokenValidator::new(&config.auth)))
            .service(CheckTokenRoute::new())
            .service(CreateWalletRoute::<SqliteDatabase>::new())
            .service(MyWalletRoute::<SqliteDatabase>::new())
            .service(MyTransactionsRoute::<SqliteDatabase>::new())
            .service(FundWalletRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(TransactionByIdRoute::<SqliteDatabase>::new())
            .service(VerifyFundingRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(WalletForPrincipalRoute::<SqliteDatabase>::new())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(AvailableOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(RespondToOrderRoute::<SqliteDatabase>::new())
            .service(SetAvailabilityRoute::<SqliteDatabase>::new())
            .service(AcceptPickupRoute::<SqliteDatabase>::new())
            .service(MarkDeliveredRoute::<SqliteDatabase>::new())
            .service(ConfirmDeliveryRoute::<SqliteDatabase>::new())
            .service(SettleVendorRoute::<SqliteDatabase>::new())
            .service(SettleRiderRoute::<SqliteDatabase>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let paystack_whitelist = config.paystack_whitelist.clone();
        let paystack_scope = web::scope("/paystack")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = match (peer_ip, &paystack_whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        let allowed = whitelist.contains(&ip);
                        if !allowed {
                            warn!("🔐️ Paystack webhook from {ip}, which is not on the whitelist. Denying access.");
                        }
                        allowed
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("🔐️ No IP address found in Paystack webhook request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    srv.call(req)
                } else {
                    ok(req.error_response(AuthenticationError(AuthError::ForbiddenPeer))).boxed_local()
                }
            })
            .service(PaystackWebhookRoute::<SqliteDatabase, PaystackGateway>::new());
        app.service(health).service(auth_scope).service(paystack_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
