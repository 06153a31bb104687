//! Authentication middleware.
//!
//! Wrap a scope in [`JwtAuthFactory`] and every request in it must carry a valid access token. The decoded
//! [`JwtClaims`] are stored in the request extensions, where the [`super::AclMiddlewareFactory`] and the
//! `JwtClaims` extractor pick them up.
use std::{pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{extract_access_token, TokenValidator},
    errors::{AuthError, ServerError},
};

pub struct JwtAuthFactory {
    validator: Arc<TokenValidator>,
}

impl JwtAuthFactory {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator: Arc::new(validator) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthService { validator: Arc::clone(&self.validator), service: Rc::new(service) })
    }
}

pub struct JwtAuthService<S> {
    validator: Arc<TokenValidator>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = Arc::clone(&self.validator);
        Box::pin(async move {
            let token = extract_access_token(req.request()).ok_or_else(|| {
                debug!("🔐️ No access token in request to {}", req.path());
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            let claims = validator.validate(&token).map_err(|e| {
                info!("🔐️ Rejected access token for {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            trace!("🔐️ Authenticated {} as {}", claims.sub, claims.role);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
