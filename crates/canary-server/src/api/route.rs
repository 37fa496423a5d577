use actix_web::web;

use super::{admin, health, ingress, lock};

/// Register every HTTP endpoint of the console
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::routes)
        .configure(lock::routes)
        .configure(ingress::routes)
        .service(admin::routes());
}
