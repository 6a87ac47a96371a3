use std::sync::Arc;

use actix_web::{Either, HttpResponse, Responder, web};
use tracing::trace;

use super::helpers::error_response;
use super::types::{ShortenForm, ShortenResponse};
use crate::services::{AllocationService, CreateRequest};

pub struct ShortenService;

impl ShortenService {
    pub async fn shorten(
        body: Either<web::Json<ShortenForm>, web::Form<ShortenForm>>,
        service: web::Data<Arc<AllocationService>>,
    ) -> impl Responder {
        let form = match body {
            Either::Left(json) => json.into_inner(),
            Either::Right(form) => form.into_inner(),
        };
        trace!("Shorten request for '{}'", form.url);

        let mut req = CreateRequest::new(form.url);
        if let Some(alias) = form.custom_alias {
            req = req.with_alias(alias);
        }

        match service.create(req).await {
            Ok(mapping) => HttpResponse::Ok().json(ShortenResponse::from(mapping)),
            Err(e) => error_response(&e),
        }
    }
}
