use actix_web::web::*;

mod admin;
mod auth;
mod health;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/api")
            .configure(auth::configure)
            .configure(admin::configure)
            .configure(health::configure),
    );
}
