use crate::constants::{DEVICE_ID_HEADER, REQUEST_ID_HEADER, USER_ID_HEADER};
use crate::errors::GenericError;
use crate::schemas::RequestMetaData;
use crate::utils::{bytes_to_payload, get_header_value};
use actix_web::body::{self, BoxBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage};
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::future::{ready, Ready};
use std::rc::Rc;
use tracing::instrument;
use uuid::Uuid;

// Middlware for saving the request and response into the tracing
pub struct ReadReqResMiddleware<S> {
    service: Rc<RefCell<S>>,
}

impl<S> Service<ServiceRequest> for ReadReqResMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    #[instrument(skip(self), name = "Request Response Payload", fields(path = %req.path()))]
    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        if req.path().starts_with("/api-docs/") {
            return Box::pin(async move { svc.call(req).await });
        }
        Box::pin(async move {
            // Re-set verbatim: webhook signatures are computed over these bytes.
            let request_bytes: web::Bytes = req.extract::<web::Bytes>().await?;
            let request_str = String::from_utf8_lossy(&request_bytes).to_string();
            tracing::info!({%request_str}, "HTTP Request");
            req.set_payload(bytes_to_payload(request_bytes));

            let fut = svc.call(req).await?;

            let (req, res) = fut.into_parts();
            let (res, body) = res.into_parts();
            let body_bytes = match body::to_bytes(body).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    tracing::error!("Error reading response body");
                    web::Bytes::new()
                }
            };
            let response_str = match std::str::from_utf8(&body_bytes) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    tracing::error!("Error decoding response body");
                    String::from("")
                }
            };
            tracing::info!({%response_str}, "HTTP Response");
            let res = res.set_body(BoxBody::new(body_bytes));
            Ok(ServiceResponse::new(req, res))
        })
    }
}

pub struct SaveRequestResponse;

impl<S> Transform<S, ServiceRequest> for SaveRequestResponse
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ReadReqResMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ReadReqResMiddleware {
            service: Rc::new(RefCell::new(service)),
        }))
    }
}

fn request_meta_data(req: &ServiceRequest) -> Result<RequestMetaData, GenericError> {
    let request_id = get_header_value(req, REQUEST_ID_HEADER)
        .ok_or_else(|| GenericError::ValidationError(format!("{} is missing", REQUEST_ID_HEADER)))?;
    let device_id = get_header_value(req, DEVICE_ID_HEADER)
        .ok_or_else(|| GenericError::ValidationError(format!("{} is missing", DEVICE_ID_HEADER)))?;
    let user_id = get_header_value(req, USER_ID_HEADER)
        .ok_or_else(|| GenericError::ValidationError(format!("{} is missing", USER_ID_HEADER)))?;
    let user_id = Uuid::parse_str(user_id.trim()).map_err(|_| {
        GenericError::ValidationError(format!("{} must be a valid UUID", USER_ID_HEADER))
    })?;
    Ok(RequestMetaData {
        request_id,
        device_id,
        user_id,
    })
}

// Middleware to validate the header in incoming requests
pub struct HeaderMiddleware<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for HeaderMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match request_meta_data(&req) {
            Ok(meta_data) => {
                req.extensions_mut().insert::<RequestMetaData>(meta_data);
            }
            Err(error) => {
                tracing::warn!("Rejected request headers: {}", error);
                let (request, _pl) = req.into_parts();
                return Box::pin(async { Ok(ServiceResponse::from_err(error, request)) });
            }
        }

        let srv = Rc::clone(&self.service);
        Box::pin(async move {
            let res = srv.call(req).await?;
            Ok(res)
        })
    }
}

/// Resolves the acting user and request identifiers into [`RequestMetaData`].
pub struct HeaderValidation;

impl<S> Transform<S, ServiceRequest> for HeaderValidation
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = HeaderMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HeaderMiddleware {
            service: Rc::new(service),
        }))
    }
}
