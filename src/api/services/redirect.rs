use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use super::helpers::error_response;
use crate::errors::ShortmintError;
use crate::services::AllocationService;
use crate::utils::is_valid_short_code;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        service: web::Data<Arc<AllocationService>>,
    ) -> impl Responder {
        let code = path.into_inner();

        // Malformed codes never reach the cache or the store
        if !is_valid_short_code(&code, service.policy().max_alias_length) {
            trace!("Invalid short code rejected: {}", code);
            return error_response(&ShortmintError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        match service.resolve(&code).await {
            Ok(mapping) => HttpResponse::Found()
                .insert_header(("Location", mapping.original_url))
                .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
                .finish(),
            Err(e) => error_response(&e),
        }
    }
}
