use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};

use super::helpers::error_response;
use super::types::DeleteBody;
use crate::services::{AllocationService, DeleteRequest};

pub struct DeleteService;

impl DeleteService {
    pub async fn delete(
        body: web::Json<DeleteBody>,
        service: web::Data<Arc<AllocationService>>,
    ) -> impl Responder {
        let body = body.into_inner();
        let req = DeleteRequest {
            code: body.short_code,
            url: body.url,
        };
        match service.delete(req).await {
            Ok(_) => HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body("URL deleted successfully."),
            Err(e) => error_response(&e),
        }
    }
}
