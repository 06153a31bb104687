use chow_payment_engine::traits::{
    GatewayClientError,
    GatewayPaymentRequest,
    GatewaySession,
    GatewayVerification,
    PaymentGatewayClient,
};
use mockall::mock;

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGatewayClient for Gateway {
        async fn initialize_payment(&self, request: GatewayPaymentRequest) -> Result<GatewaySession, GatewayClientError>;
        async fn verify_payment(&self, reference: &str) -> Result<GatewayVerification, GatewayClientError>;
    }
}
