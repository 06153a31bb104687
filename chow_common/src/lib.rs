//! Value types shared by the Chow payment engine, the Paystack client and the payment server.
mod naira;

pub mod helpers;
pub mod op;
mod secret;

pub use naira::{Naira, NairaConversionError, KOBO_PER_NAIRA, NAIRA_CURRENCY_CODE};
pub use secret::Secret;
