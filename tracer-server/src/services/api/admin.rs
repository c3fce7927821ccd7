use actix_web::web::*;

use crate::handlers::admin;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/admin").route("/throttle/clear", post().to(admin::clear_throttle_table)));
}
