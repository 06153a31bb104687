//! Data types that are stored in, and read back from, the payment engine's database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use chow_common::Naira;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

// Display, FromStr and From<String> for the lower-case text enums stored in the database.
macro_rules! text_enum {
    ($name:ident, $default:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $text),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("Invalid {}: {s}", stringify!($name)))),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!(
                        "Invalid {}: {value}. But this conversion cannot fail. Defaulting to {}",
                        stringify!($name),
                        $name::$default
                    );
                    $name::$default
                })
            }
        }
    };
}

//--------------------------------------         Role        ---------------------------------------------------------
/// The three kinds of principal that own a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Vendor,
    Rider,
}

text_enum!(Role, Customer, { Customer => "customer", Vendor => "vendor", Rider => "rider" });

//--------------------------------------      Principal      ---------------------------------------------------------
/// A role-tagged reference to a customer, vendor or rider.
///
/// Wallets and transactions are always looked up by the full pair, never by id alone, so that a vendor and a customer
/// that happen to share an id can never see each other's money.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub role: Role,
    pub id: String,
}

impl Principal {
    pub fn new<S: Into<String>>(role: Role, id: S) -> Self {
        Self { role, id: id.into() }
    }

    pub fn customer<S: Into<String>>(id: S) -> Self {
        Self::new(Role::Customer, id)
    }

    pub fn vendor<S: Into<String>>(id: S) -> Self {
        Self::new(Role::Vendor, id)
    }

    pub fn rider<S: Into<String>>(id: S) -> Self {
        Self::new(Role::Rider, id)
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

//--------------------------------------        Wallet       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub owner_role: Role,
    pub owner_id: String,
    pub balance: Naira,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn owner(&self) -> Principal {
        Principal::new(self.owner_role, self.owner_id.clone())
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting for the gateway to confirm the payment
    Pending,
    /// Terminal. The wallet balance reflects this transaction.
    Completed,
    /// Terminal. The balance was never touched.
    Failed,
}

text_enum!(TransactionStatus, Pending, { Pending => "pending", Completed => "completed", Failed => "failed" });

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

//-------------------------------------- TransactionDirection ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    Credit,
    Debit,
}

text_enum!(TransactionDirection, Credit, { Credit => "credit", Debit => "debit" });

//--------------------------------------     Transaction     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    /// Also the correlation id sent to the gateway, and therefore the idempotency key for webhooks.
    pub id: i64,
    pub owner_role: Role,
    pub owner_id: String,
    pub amount: Naira,
    #[serde(rename = "type")]
    pub direction: TransactionDirection,
    pub status: TransactionStatus,
    pub reference: Option<String>,
    pub order_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn owner(&self) -> Principal {
        Principal::new(self.owner_role, self.owner_id.clone())
    }

    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        self.owner_role == principal.role && self.owner_id == principal.id
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    #[sqlx(rename = "new")]
    #[serde(rename = "new")]
    New,
    #[sqlx(rename = "in-transit")]
    #[serde(rename = "in-transit")]
    InTransit,
    #[sqlx(rename = "delivered")]
    #[serde(rename = "delivered")]
    Delivered,
}

text_enum!(OrderStatus, New, { New => "new", InTransit => "in-transit", Delivered => "delivered" });

//--------------------------------------    AcceptedStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AcceptedStatus {
    Pending,
    Accepted,
    Declined,
}

text_enum!(AcceptedStatus, Pending, { Pending => "pending", Accepted => "accepted", Declined => "declined" });

//--------------------------------------    SettlementLeg    ---------------------------------------------------------
/// An order is paid out in two independent legs: the item total to the vendor and the delivery fee to the rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementLeg {
    Vendor,
    Rider,
}

text_enum!(SettlementLeg, Vendor, { Vendor => "vendor", Rider => "rider" });

//--------------------------------------       LineItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub menu_item_id: String,
    pub quantity: i64,
    /// Price per unit at the time the order was placed
    pub unit_price: Naira,
}

impl LineItem {
    pub fn new<S: Into<String>>(menu_item_id: S, quantity: i64, unit_price: Naira) -> Self {
        Self { menu_item_id: menu_item_id.into(), quantity, unit_price }
    }

    /// `None` if the total does not fit in an `i64` of kobo.
    pub fn line_total(&self) -> Option<Naira> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: String,
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    pub delivery_fee: Naira,
}

impl NewOrder {
    pub fn new<S1: Into<String>, S2: Into<String>>(customer_id: S1, vendor_id: S2, delivery_fee: Naira) -> Self {
        Self { customer_id: customer_id.into(), vendor_id: vendor_id.into(), items: vec![], delivery_fee }
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    /// The price of the items, excluding delivery. `None` on overflow.
    pub fn total_price(&self) -> Option<Naira> {
        self.items.iter().try_fold(Naira::default(), |acc, item| acc.checked_add(item.line_total()?))
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: String,
    pub vendor_id: String,
    pub rider_id: Option<String>,
    #[sqlx(skip)]
    pub items: Vec<LineItem>,
    pub total_price: Naira,
    pub delivery_fee: Naira,
    pub order_status: OrderStatus,
    pub accepted_status: AcceptedStatus,
    pub available_for_pickup: bool,
    pub picked_up: bool,
    pub delivered_status: bool,
    pub confirm_delivered_by_customer: bool,
    pub vendor_paid: bool,
    pub rider_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn customer(&self) -> Principal {
        Principal::customer(self.customer_id.clone())
    }

    pub fn vendor(&self) -> Principal {
        Principal::vendor(self.vendor_id.clone())
    }

    pub fn rider(&self) -> Option<Principal> {
        self.rider_id.as_ref().map(|id| Principal::rider(id.clone()))
    }

    /// True if the principal is the customer, vendor or assigned rider on this order.
    pub fn is_party(&self, principal: &Principal) -> bool {
        match principal.role {
            Role::Customer => self.customer_id == principal.id,
            Role::Vendor => self.vendor_id == principal.id,
            Role::Rider => self.rider_id.as_deref() == Some(principal.id.as_str()),
        }
    }

    pub fn is_settled(&self, leg: SettlementLeg) -> bool {
        match leg {
            SettlementLeg::Vendor => self.vendor_paid,
            SettlementLeg::Rider => self.rider_paid,
        }
    }
}
