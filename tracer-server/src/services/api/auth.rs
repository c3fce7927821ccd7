use actix_web::web::*;

use crate::handlers::auth;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/auth")
            .route("/otp", post().to(auth::request_password_reset_otp))
            .route("/otp/verify", post().to(auth::verify_password_reset_otp))
            .route("/password", put().to(auth::reset_password)),
    );
}
