pub mod auth;
pub mod authorization;
pub mod throttle;

use tracer_common::token::TokenError;

use actix_web::HttpRequest;

use crate::handlers::error::HttpErrorResponse;

pub trait TokenLocation {
    fn get_from_request<'a>(req: &'a HttpRequest, key: &str) -> Option<&'a str>;
}

pub struct FromHeader {}

impl TokenLocation for FromHeader {
    fn get_from_request<'a>(req: &'a HttpRequest, key: &str) -> Option<&'a str> {
        let header = req.headers().get(key)?;
        header.to_str().ok()
    }
}

#[inline(always)]
fn into_actix_error_res<T>(result: Result<T, TokenError>) -> Result<T, HttpErrorResponse> {
    match result {
        Ok(t) => Ok(t),
        Err(TokenError::TokenInvalid) => Err(HttpErrorResponse::BadToken("Token is invalid")),
        Err(TokenError::TokenExpired) => Err(HttpErrorResponse::TokenExpired("Token is expired")),
        Err(TokenError::TokenMissing) => Err(HttpErrorResponse::TokenMissing("Token is missing")),
        Err(TokenError::WrongTokenType) => {
            Err(HttpErrorResponse::WrongTokenType("Incorrect token type"))
        }
    }
}
