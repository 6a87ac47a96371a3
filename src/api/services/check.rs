use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};

use super::helpers::error_response;
use super::types::{CheckQuery, CheckResponse};
use crate::services::AllocationService;

pub struct CheckService;

impl CheckService {
    /// Both keys given: exists only when the alias points at the URL
    pub async fn check(
        query: web::Query<CheckQuery>,
        service: web::Data<Arc<AllocationService>>,
    ) -> impl Responder {
        let query = query.into_inner();
        match service
            .check(query.custom_alias.as_deref(), query.url.as_deref())
            .await
        {
            Ok(mapping) => HttpResponse::Ok().json(CheckResponse {
                exists: mapping.is_some(),
                mapping,
            }),
            Err(e) => error_response(&e),
        }
    }
}
