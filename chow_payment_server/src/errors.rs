use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use chow_payment_engine::{
    helpers::WebhookSignatureError,
    order_objects::TransitionError,
    traits::{GatewayClientError, LedgerError, OrderStoreError},
    AccountApiError,
    OrderFlowError,
    WalletApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("{0}")]
    InvalidOrderState(String),
    #[error("{0}")]
    InsufficientBalance(String),
    #[error("Webhook rejected. {0}")]
    WebhookSignatureInvalid(String),
    #[error("{0}")]
    UnhandledEvent(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderState(_) => StatusCode::BAD_REQUEST,
            Self::UnhandledEvent(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
            Self::WebhookSignatureInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
                AuthError::NotAWalletHolder => StatusCode::FORBIDDEN,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was found in the request.")]
    MissingToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Requests from this address are not allowed.")]
    ForbiddenPeer,
    #[error("Administrators do not have a wallet.")]
    NotAWalletHolder,
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(_) => Self::BackendError(e.to_string()),
            LedgerError::Conflict(_) => Self::Conflict(e.to_string()),
            LedgerError::WalletNotFound(_) | LedgerError::TransactionNotFound(_) | LedgerError::OrderNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            LedgerError::NotAFundingTransaction(_) | LedgerError::InvalidAmount(_) => {
                Self::ValidationError(e.to_string())
            },
            LedgerError::TransactionAlreadyFinalized { .. }
            | LedgerError::ReferenceAlreadyExists(_)
            | LedgerError::AlreadySettled { .. } => Self::Conflict(e.to_string()),
            LedgerError::InsufficientBalance { .. } => Self::InsufficientBalance(e.to_string()),
            LedgerError::OrderNotSettleable(_) => Self::InvalidOrderState(e.to_string()),
        }
    }
}

impl From<GatewayClientError> for ServerError {
    fn from(e: GatewayClientError) -> Self {
        Self::GatewayError(e.to_string())
    }
}

impl From<TransitionError> for ServerError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Forbidden { .. } => Self::InsufficientPermissions(e.to_string()),
            TransitionError::InvalidOrderState { .. } => Self::InvalidOrderState(e.to_string()),
            TransitionError::AlreadySettled { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<WalletApiError> for ServerError {
    fn from(e: WalletApiError) -> Self {
        match e {
            WalletApiError::Validation(msg) => Self::ValidationError(msg),
            WalletApiError::SignatureInvalid(WebhookSignatureError::NotConfigured) => {
                Self::ConfigurationError(WebhookSignatureError::NotConfigured.to_string())
            },
            WalletApiError::SignatureInvalid(e) => Self::WebhookSignatureInvalid(e.to_string()),
            WalletApiError::UnhandledEvent(_) => Self::UnhandledEvent(e.to_string()),
            WalletApiError::Forbidden(msg) => Self::InsufficientPermissions(msg),
            WalletApiError::Gateway(e) => e.into(),
            WalletApiError::Ledger(e) => e.into(),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(msg) => Self::ValidationError(msg),
            OrderFlowError::Forbidden(msg) => Self::InsufficientPermissions(msg),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Transition(e) => e.into(),
            OrderFlowError::Store(msg) => Self::BackendError(msg),
            OrderFlowError::Conflict(msg) => Self::Conflict(msg),
            OrderFlowError::Ledger(e) => e.into(),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::Forbidden(msg) => Self::InsufficientPermissions(msg),
            AccountApiError::Ledger(e) => e.into(),
        }
    }
}
