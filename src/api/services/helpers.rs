use actix_web::HttpResponse;
use tracing::{debug, error};

use super::types::ErrorBody;
use crate::errors::ShortmintError;

/// Map a service error onto its status code and JSON body
pub fn error_response(err: &ShortmintError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }
    HttpResponse::build(status)
        .insert_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ErrorBody::from(err))
}
