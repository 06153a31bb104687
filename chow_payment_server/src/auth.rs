//! Access tokens.
//!
//! Users register and log in with the identity service, which issues HS256 JWTs signed with the shared
//! `CHOW_JWT_SECRET`. This server only needs to validate them and to read the principal out of the claims.
//! [`TokenIssuer`] exists so that tooling and tests can mint tokens with the same key.
use std::{
    fmt::Display,
    future::{ready, Ready},
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chow_payment_engine::db_types::{Principal, Role};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "cps_access_token";
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// The roles a token may carry. Every role except `Admin` owns a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Vendor,
    Rider,
    Admin,
}

impl UserRole {
    pub fn wallet_role(&self) -> Option<Role> {
        match self {
            Self::Customer => Some(Role::Customer),
            Self::Vendor => Some(Role::Vendor),
            Self::Rider => Some(Role::Rider),
            Self::Admin => None,
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Rider => "rider",
            Self::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id in the identity service
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: UserRole,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(sub: S, role: UserRole) -> Self {
        Self { sub: sub.into(), email: None, role }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// The wallet principal for this user, or `None` for administrators.
    pub fn principal(&self) -> Option<Principal> {
        self.role.wallet_role().map(|role| Principal::new(role, self.sub.clone()))
    }

    /// Like [`Self::principal`], but for routes that only make sense for wallet holders.
    pub fn wallet_holder(&self) -> Result<Principal, ServerError> {
        self.principal().ok_or(ServerError::AuthenticationError(AuthError::NotAWalletHolder))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("🔐️ A handler asked for JWT claims, but the request was not authenticated");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

/// Validates access tokens.
#[derive(Clone)]
pub struct TokenValidator {
    key: Hs256Key,
    time_options: TimeOptions,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: Hs256Key::new(config.jwt_secret.reveal().as_bytes()), time_options: TimeOptions::default() }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token: Token<JwtClaims> =
            Hs256.validator(&self.key).validate(&untrusted).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token.claims().validate_expiration(&self.time_options).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(token.claims().custom.clone())
    }
}

pub struct TokenIssuer {
    key: Hs256Key,
    time_options: TimeOptions,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: Hs256Key::new(config.jwt_secret.reveal().as_bytes()), time_options: TimeOptions::default() }
    }

    /// Issue a new access token for the given claims. The caller is responsible for having authenticated the user.
    pub fn issue_token(&self, claims: JwtClaims, duration: Option<chrono::Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| chrono::Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS));
        let claims = Claims::new(claims).set_duration_and_issuance(&self.time_options, duration);
        let header = Header::empty().with_token_type("JWT");
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }
}

/// Reads the access token from the `cps_access_token` header, or failing that, an `Authorization: Bearer` header.
pub fn extract_access_token(req: &HttpRequest) -> Option<String> {
    let headers = req.headers();
    headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get(actix_web::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().strip_prefix("Bearer "))
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
}
