use tracer_common::models::user::Role;
use tracer_common::token::auth_token::AuthTokenClaims;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures::future;
use std::marker::PhantomData;

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

/// A policy deciding which roles may reach a handler. Policies are closed
/// over the [`Role`] enum, so adding a role forces every policy to be
/// revisited at compile time.
pub trait AccessPolicy {
    fn name() -> &'static str;
    fn permits(role: Role) -> bool;
}

pub struct AdminOnly {}
pub struct SuperAdminOnly {}

impl AccessPolicy for AdminOnly {
    fn name() -> &'static str {
        "AdminOnly"
    }

    fn permits(role: Role) -> bool {
        matches!(role, Role::Admin | Role::SuperAdmin)
    }
}

impl AccessPolicy for SuperAdminOnly {
    fn name() -> &'static str {
        "SuperAdminOnly"
    }

    fn permits(role: Role) -> bool {
        matches!(role, Role::SuperAdmin)
    }
}

pub struct Authorized<P: AccessPolicy> {
    pub claims: AuthTokenClaims,
    _marker: PhantomData<P>,
}

impl<P: AccessPolicy> FromRequest for Authorized<P> {
    type Error = HttpErrorResponse;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let verified =
            match VerifiedToken::<Access, FromHeader>::from_request(req, payload).into_inner() {
                Ok(v) => v,
                Err(e) => return future::err(e),
            };

        if !P::permits(verified.claims.user_role) {
            log::warn!(
                "User {} was denied access by policy {}",
                verified.claims.user_id,
                P::name(),
            );
            return future::err(HttpErrorResponse::Forbidden(
                "User does not have permission to access this resource",
            ));
        }

        future::ok(Authorized {
            claims: verified.claims,
            _marker: PhantomData,
        })
    }
}
