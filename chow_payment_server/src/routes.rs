//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use chow_payment_engine::{
    db_types::{NewOrder, Principal, Role, SettlementLeg},
    traits::{LedgerManagement, OrderManagement, PaymentGatewayClient},
    AccountApi,
    OrderFlowApi,
    WalletApi,
};
use log::*;

use crate::{
    auth::{JwtClaims, UserRole},
    data_objects::{AvailabilityRequest, FundWalletRequest, PlaceOrderRequest, RespondToOrderRequest},
    errors::{AuthError, ServerError},
};

/// Everything the order routes need from a backend.
pub trait OrderBackend: OrderManagement + LedgerManagement {}

impl<T: OrderManagement + LedgerManagement> OrderBackend for T {}

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

route!(check_token => Get "/check_token" requires [UserRole::Customer, UserRole::Vendor, UserRole::Rider, UserRole::Admin]);
/// Echoes the claims of a valid access token. Clients use it to check that their token is still good.
pub async fn check_token(claims: JwtClaims) -> HttpResponse {
    trace!("💻️ Token check for {}", claims.sub);
    HttpResponse::Ok().json(claims)
}

//----------------------------------------------   Wallet  ----------------------------------------------------
route!(create_wallet => Post "/wallet" impl LedgerManagement where requires [UserRole::Customer, UserRole::Vendor, UserRole::Rider]);
/// Creates the caller's wallet. The identity service calls this when a user registers, but it is safe to call again:
/// an existing wallet is returned unchanged.
pub async fn create_wallet<B: LedgerManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let owner = claims.wallet_holder()?;
    debug!("💻️ POST create_wallet for {owner}");
    let wallet = api.create_wallet(&owner).await?;
    Ok(HttpResponse::Ok().json(wallet))
}

route!(my_wallet => Get "/wallet" impl LedgerManagement where requires [UserRole::Customer, UserRole::Vendor, UserRole::Rider]);
pub async fn my_wallet<B: LedgerManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let owner = claims.wallet_holder()?;
    debug!("💻️ GET my_wallet for {owner}");
    let wallet = api.wallet(&owner).await?;
    Ok(HttpResponse::Ok().json(wallet))
}

route!(my_transactions => Get "/wallet/transactions" impl LedgerManagement where requires [UserRole::Customer, UserRole::Vendor, UserRole::Rider]);
/// The caller's transaction history, newest first.
pub async fn my_transactions<B: LedgerManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let owner = claims.wallet_holder()?;
    debug!("💻️ GET my_transactions for {owner}");
    let transactions = api.transactions(&owner).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

route!(fund_wallet => Post "/wallet/fund" impl LedgerManagement, PaymentGatewayClient where requires [UserRole::Customer, UserRole::Vendor, UserRole::Rider]);
/// Route handler for the wallet funding endpoint
///
/// Records a pending credit for the caller and opens a Paystack checkout for it. The response carries the
/// `authorization_url` the client should send the user to. The wallet is only credited once Paystack confirms the
/// payment, either through the webhook or through `/api/transaction/{id}/verify`.
pub async fn fund_wallet<B, G>(
    claims: JwtClaims,
    body: web::Json<FundWalletRequest>,
    api: web::Data<WalletApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerManagement,
    G: PaymentGatewayClient,
{
    let owner = claims.wallet_holder()?;
    let FundWalletRequest { amount, email } = body.into_inner();
    let email = email.or_else(|| claims.email.clone()).ok_or_else(|| {
        ServerError::ValidationError("An email address is required to fund a wallet".to_string())
    })?;
    debug!("💻️ POST fund_wallet for {owner}: {amount}");
    let session = api.initialize_funding(&owner, &email, amount).await?;
    Ok(HttpResponse::Ok().json(session))
}

route!(transaction_by_id => Get "/transaction/{id}" impl LedgerManagement);
/// Fetches a single transaction. Wallet holders can only see their own transactions; admins can see any.
pub async fn transaction_by_id<B: LedgerManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET transaction {id} for {}", claims.sub);
    let viewer = claims.principal();
    let transaction = api.transaction(id, viewer.as_ref()).await?;
    Ok(HttpResponse::Ok().json(transaction))
}

route!(verify_funding => Post "/transaction/{id}/verify" impl LedgerManagement, PaymentGatewayClient);
/// Asks Paystack for the outcome of a funding transaction. Use this when a webhook never arrived.
///
/// This applies exactly the same reconciliation as the webhook, so it is safe to call any number of times.
pub async fn verify_funding<B, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<WalletApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerManagement,
    G: PaymentGatewayClient,
{
    let id = path.into_inner();
    debug!("💻️ POST verify_funding {id} for {}", claims.sub);
    let requester = claims.principal();
    let outcome = api.verify_funding(id, requester.as_ref()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(wallet_for_principal => Get "/wallets/{role}/{id}" impl LedgerManagement where requires [UserRole::Admin]);
/// Admins can look up any wallet by role and id.
pub async fn wallet_for_principal<B: LedgerManagement>(
    path: web::Path<(String, String)>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (role, id) = path.into_inner();
    let role = role.parse::<Role>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    let owner = Principal::new(role, id);
    debug!("💻️ GET wallet for {owner}");
    let wallet = api.wallet(&owner).await?;
    Ok(HttpResponse::Ok().json(wallet))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl OrderBackend where requires [UserRole::Customer]);
/// Places an order for the caller. Unit prices are captured as given and the total is computed by the server.
pub async fn place_order<B: OrderBackend>(
    claims: JwtClaims,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PlaceOrderRequest { vendor_id, items, delivery_fee } = body.into_inner();
    debug!("💻️ POST place_order for customer {} with vendor {vendor_id}", claims.sub);
    let order = NewOrder { customer_id: claims.sub, vendor_id, items, delivery_fee };
    let order = api.place_order(order).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(my_orders => Get "/orders" impl OrderBackend where requires [UserRole::Customer, UserRole::Vendor, UserRole::Rider]);
/// The caller's orders: placed by a customer, received by a vendor or carried by a rider.
pub async fn my_orders<B: OrderBackend>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let party = claims.wallet_holder()?;
    debug!("💻️ GET my_orders for {party}");
    let orders = api.orders_for(&party).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(available_orders => Get "/orders/available" impl OrderBackend where requires [UserRole::Rider]);
/// The pickup board: accepted orders that vendors have marked as ready and no rider has claimed yet.
pub async fn available_orders<B: OrderBackend>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET available_orders");
    let orders = api.available_for_pickup().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/order/{id}" impl OrderBackend);
/// Fetch an order by id. Only the order's customer, vendor and rider (and admins) may see it.
pub async fn order_by_id<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET order {id} for {}", claims.sub);
    let viewer = claims.principal();
    let order = api.order_for(id, viewer.as_ref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(respond_to_order => Post "/order/{id}/respond" impl OrderBackend where requires [UserRole::Vendor]);
pub async fn respond_to_order<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<RespondToOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let accept = body.accept;
    debug!("💻️ POST respond_to_order {id} by vendor {}: accept={accept}", claims.sub);
    let order = api.respond(id, &claims.sub, accept).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(set_availability => Post "/order/{id}/availability" impl OrderBackend where requires [UserRole::Vendor]);
pub async fn set_availability<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<AvailabilityRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let available = body.available;
    debug!("💻️ POST set_availability {id} by vendor {}: {available}", claims.sub);
    let order = api.set_availability(id, &claims.sub, available).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(accept_pickup => Post "/order/{id}/pickup" impl OrderBackend where requires [UserRole::Rider]);
pub async fn accept_pickup<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST accept_pickup {id} by rider {}", claims.sub);
    let order = api.accept_pickup(id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(mark_delivered => Post "/order/{id}/deliver" impl OrderBackend where requires [UserRole::Rider]);
pub async fn mark_delivered<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST mark_delivered {id} by rider {}", claims.sub);
    let order = api.mark_delivered(id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_delivery => Post "/order/{id}/confirm" impl OrderBackend where requires [UserRole::Customer]);
pub async fn confirm_delivery<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST confirm_delivery {id} by customer {}", claims.sub);
    let order = api.confirm_delivery(id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Settlement  ----------------------------------------------------
route!(settle_vendor => Post "/order/{id}/settle/vendor" impl OrderBackend where requires [UserRole::Customer, UserRole::Admin]);
/// Pays the order's item total from the customer's wallet to the vendor's wallet.
///
/// Only possible once the rider has delivered the order and the customer has confirmed it. Each leg is paid at most
/// once.
pub async fn settle_vendor<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    settle_leg(claims, path.into_inner(), SettlementLeg::Vendor, &api).await
}

route!(settle_rider => Post "/order/{id}/settle/rider" impl OrderBackend where requires [UserRole::Customer, UserRole::Admin]);
/// Pays the order's delivery fee from the customer's wallet to the rider's wallet. Same rules as the vendor leg.
pub async fn settle_rider<B: OrderBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    settle_leg(claims, path.into_inner(), SettlementLeg::Rider, &api).await
}

async fn settle_leg<B: OrderBackend>(
    claims: JwtClaims,
    order_id: i64,
    leg: SettlementLeg,
    api: &OrderFlowApi<B>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST settle {leg} leg of order {order_id} by {} ({})", claims.sub, claims.role);
    let actor = match claims.role {
        UserRole::Admin => None,
        UserRole::Customer => claims.principal(),
        _ => {
            return Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(
                "Only the customer or an admin can settle an order".to_string(),
            )))
        },
    };
    let receipt = api.settle(order_id, leg, actor.as_ref()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}
