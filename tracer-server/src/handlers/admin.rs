use actix_web::{web, HttpResponse};
use tracer_common::db::{self, DbThreadPool};
use tracer_common::request_io::OutputStatus;

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::authorization::{AdminOnly, Authorized};

pub async fn clear_throttle_table(
    db_thread_pool: web::Data<DbThreadPool>,
    authorized: Authorized<AdminOnly>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let mut throttle_dao = db::throttle::Dao::new(&db_thread_pool);

    match web::block(move || throttle_dao.clear_throttle_table()).await? {
        Ok(_) => (),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(
                "Failed to clear throttle table",
            ));
        }
    };

    log::info!(
        "Throttle table cleared by admin {}",
        authorized.claims.user_id,
    );

    Ok(HttpResponse::Ok().json(OutputStatus { status: "cleared" }))
}
