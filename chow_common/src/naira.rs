use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const NAIRA_CURRENCY_CODE: &str = "NGN";
/// Paystack (and every other NGN processor) quotes amounts in kobo.
pub const KOBO_PER_NAIRA: i64 = 100;

//--------------------------------------        Naira        ---------------------------------------------------------
/// A naira amount, held as an integer number of kobo.
///
/// Arithmetic and storage use the raw kobo count. JSON carries naira (major units), e.g. `5000` or `12.50`, so that
/// clients never deal with kobo. Gateway payloads use [`Naira::to_minor_units`] explicitly.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Naira(i64);

op!(binary Naira, Add, add);
op!(binary Naira, Sub, sub);
op!(inplace Naira, AddAssign, add_assign);
op!(inplace Naira, SubAssign, sub_assign);
op!(unary Naira, Neg, neg);

impl Mul<i64> for Naira {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Serialize for Naira {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % KOBO_PER_NAIRA == 0 {
            serializer.serialize_i64(self.0 / KOBO_PER_NAIRA)
        } else {
            #[allow(clippy::cast_precision_loss)]
            serializer.serialize_f64(self.0 as f64 / KOBO_PER_NAIRA as f64)
        }
    }
}

struct NairaVisitor;

impl<'de> Visitor<'de> for NairaVisitor {
    type Value = Naira;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a naira amount with at most two decimal places")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Naira, E> {
        Naira::checked_from_naira(v).ok_or_else(|| E::custom(format!("{v} naira is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Naira, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} naira is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Naira, E> {
        let kobo = v * KOBO_PER_NAIRA as f64;
        if !kobo.is_finite() || kobo.abs() >= i64::MAX as f64 {
            return Err(E::custom(format!("{v} naira is out of range")));
        }
        let rounded = kobo.round();
        if (kobo - rounded).abs() > 1e-6 {
            return Err(E::custom(format!("{v} naira has fractional kobo")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Naira(rounded as i64))
    }
}

impl<'de> Deserialize<'de> for Naira {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NairaVisitor)
    }
}

impl Sum for Naira {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in kobo: {0}")]
pub struct NairaConversionError(String);

impl From<i64> for Naira {
    fn from(kobo: i64) -> Self {
        Self(kobo)
    }
}

impl PartialEq for Naira {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Naira {}

impl TryFrom<u64> for Naira {
    type Error = NairaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(NairaConversionError(format!("Value {} is too large to convert to kobo", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Naira {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = KOBO_PER_NAIRA.unsigned_abs();
        write!(f, "{sign}₦{}.{:02}", abs / per, abs % per)
    }
}

impl Naira {
    /// The amount in kobo
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_naira(naira: i64) -> Self {
        Self(naira * KOBO_PER_NAIRA)
    }

    pub fn checked_from_naira(naira: i64) -> Option<Self> {
        naira.checked_mul(KOBO_PER_NAIRA).map(Self)
    }

    /// Interpret a gateway amount, which is always quoted in minor units.
    pub fn from_minor_units(kobo: i64) -> Self {
        Self(kobo)
    }

    /// The amount as the gateway expects it.
    pub fn to_minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }
}
