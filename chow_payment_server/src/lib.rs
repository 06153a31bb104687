//! # Chow payment server
//! This crate hosts the HTTP server for the money side of the Chow delivery platform. It is responsible for:
//! * Opening Paystack checkouts so that customers, vendors and riders can fund their wallets.
//! * Receiving Paystack webhooks, verifying their signatures and crediting wallets exactly once.
//! * Driving orders through their lifecycle and settling the vendor and rider legs once delivery is confirmed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/paystack/webhook`: The webhook route for Paystack event notifications.
//! * `/api/...`: Wallet, order and settlement routes. These require an access token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod paystack_routes;
pub mod routes;
pub mod server;
