use actix_web::web;

mod check;
mod delete;
mod health;
mod helpers;
mod redirect;
mod shorten;
pub mod types;

pub use check::CheckService;
pub use delete::DeleteService;
pub use health::{AppStartTime, HealthService};
pub use helpers::error_response;
pub use redirect::RedirectService;
pub use shorten::ShortenService;

/// Register every route; handlers expect `Arc<AllocationService>` and
/// [`AppStartTime`] as app data
pub fn app_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/shorten", web::post().to(ShortenService::shorten))
        .route("/check-url-or-alias", web::get().to(CheckService::check))
        .route("/delete-url", web::post().to(DeleteService::delete))
        .route("/delete-url", web::delete().to(DeleteService::delete))
        .route("/r/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/r/{code}", web::head().to(RedirectService::handle_redirect))
        .route("/health", web::get().to(HealthService::health_check))
        .route("/health/live", web::get().to(HealthService::liveness_check));
}
