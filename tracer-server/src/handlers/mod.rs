pub mod admin;
pub mod auth;
pub mod health;

pub mod verification {
    use actix_web::web;
    use tracer_common::db::{self, DbThreadPool};
    use tracer_common::email::{templates::OtpMessage, EmailMessage, EmailSender};
    use tracer_common::models::password_reset_otp::OtpStatus;
    use tracer_common::otp::{Otp, OTP_LENGTH};
    use tracer_common::validators::MAX_EMAIL_LENGTH;
    use std::time::SystemTime;

    use super::error::HttpErrorResponse;
    use crate::env;

    pub async fn generate_and_email_otp(
        user_email: &str,
        db_thread_pool: &DbThreadPool,
        smtp_thread_pool: &EmailSender,
    ) -> Result<(), HttpErrorResponse> {
        let otp_expiration = SystemTime::now() + env::CONF.otp_lifetime;

        let user_email_copy = String::from(user_email);

        let otp = Otp::generate(OTP_LENGTH);
        let otp_copy = otp.clone();

        let auth_dao = db::auth::Dao::new(db_thread_pool);
        match web::block(move || {
            auth_dao.save_otp(
                &user_email_copy,
                &otp_copy,
                env::CONF.otp_max_attempts,
                otp_expiration,
            )
        })
        .await?
        {
            Ok(_) => (),
            Err(e) => {
                log::error!("{e}");
                return Err(HttpErrorResponse::InternalError("Failed to save OTP"));
            }
        };

        let message = EmailMessage {
            body: OtpMessage::generate(&otp, env::CONF.otp_lifetime),
            subject: "Your password reset code",
            from: env::CONF.email_from_address.clone(),
            reply_to: env::CONF.email_reply_to_address.clone(),
            destination: user_email,
            is_html: true,
        };

        match smtp_thread_pool.send(message).await {
            Ok(_) => (),
            Err(e) => {
                log::error!("{e}");
                return Err(HttpErrorResponse::InternalError(
                    "Failed to send OTP to user's email address",
                ));
            }
        };

        Ok(())
    }

    /// Checks the given OTP against the saved record for `user_email` and,
    /// when it matches, consumes the record so it cannot be used again. Each
    /// failed guess is counted toward the record's attempt limit.
    pub async fn verify_otp(
        user_email: &str,
        otp: &str,
        db_thread_pool: &DbThreadPool,
    ) -> Result<(), HttpErrorResponse> {
        const WRONG_OTP_MSG: &str = "OTP was incorrect";

        if user_email.len() > MAX_EMAIL_LENGTH || otp.len() > OTP_LENGTH {
            return Err(HttpErrorResponse::IncorrectCode(WRONG_OTP_MSG));
        }

        let user_email_copy = String::from(user_email);
        let otp_copy = String::from(otp);

        let auth_dao = db::auth::Dao::new(db_thread_pool);
        let status = match web::block(move || {
            auth_dao.verify_and_consume_otp(&user_email_copy, &otp_copy)
        })
        .await?
        {
            Ok(s) => s,
            Err(e) => {
                log::error!("{e}");
                return Err(HttpErrorResponse::InternalError("Failed to check OTP"));
            }
        };

        match status {
            OtpStatus::Verified => Ok(()),
            // NotFound is reported as an incorrect code to prevent user
            // enumeration
            OtpStatus::IncorrectCode | OtpStatus::NotFound => {
                Err(HttpErrorResponse::IncorrectCode(WRONG_OTP_MSG))
            }
            OtpStatus::Expired => Err(HttpErrorResponse::OtpExpired("OTP has expired")),
            OtpStatus::TooManyAttempts => Err(HttpErrorResponse::TooManyAttempts(
                "Too many incorrect attempts. Request a new OTP.",
            )),
        }
    }
}

pub mod error {
    use tracer_common::token::TokenError;

    use actix_web::http::{header, StatusCode};
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use serde::Serialize;
    use std::fmt;
    use tokio::sync::oneshot;

    #[derive(Debug)]
    pub enum HttpErrorResponse {
        // 400
        IncorrectlyFormed(&'static str),
        InputTooLong(&'static str),
        PasswordMismatch(&'static str),
        WeakPassword(&'static str),

        // 401
        BadToken(&'static str),
        TokenExpired(&'static str),
        TokenMissing(&'static str),
        WrongTokenType(&'static str),
        IncorrectCode(&'static str),
        OtpExpired(&'static str),

        // 403
        TooManyAttempts(&'static str),
        Forbidden(&'static str),

        // 404
        DoesNotExist(&'static str),

        // 429
        RateLimited(&'static str),

        // 500
        InternalError(&'static str),
    }

    #[derive(Serialize)]
    struct ErrorBody {
        error_type: &'static str,
        message: &'static str,
    }

    impl HttpErrorResponse {
        fn parts(&self) -> ErrorBody {
            let (error_type, message) = match self {
                HttpErrorResponse::IncorrectlyFormed(msg) => ("incorrectly_formed", *msg),
                HttpErrorResponse::InputTooLong(msg) => ("input_too_long", *msg),
                HttpErrorResponse::PasswordMismatch(msg) => ("password_mismatch", *msg),
                HttpErrorResponse::WeakPassword(msg) => ("weak_password", *msg),
                HttpErrorResponse::BadToken(msg) => ("bad_token", *msg),
                HttpErrorResponse::TokenExpired(msg) => ("token_expired", *msg),
                HttpErrorResponse::TokenMissing(msg) => ("token_missing", *msg),
                HttpErrorResponse::WrongTokenType(msg) => ("wrong_token_type", *msg),
                HttpErrorResponse::IncorrectCode(msg) => ("incorrect_code", *msg),
                HttpErrorResponse::OtpExpired(msg) => ("otp_expired", *msg),
                HttpErrorResponse::TooManyAttempts(msg) => ("too_many_attempts", *msg),
                HttpErrorResponse::Forbidden(msg) => ("forbidden", *msg),
                HttpErrorResponse::DoesNotExist(msg) => ("does_not_exist", *msg),
                HttpErrorResponse::RateLimited(msg) => ("rate_limited", *msg),
                HttpErrorResponse::InternalError(msg) => ("internal_error", *msg),
            };

            ErrorBody {
                error_type,
                message,
            }
        }
    }

    impl std::error::Error for HttpErrorResponse {}

    impl fmt::Display for HttpErrorResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let body = self.parts();
            write!(f, "{}: {}", body.error_type, body.message)
        }
    }

    impl actix_web::error::ResponseError for HttpErrorResponse {
        fn error_response(&self) -> HttpResponse {
            HttpResponseBuilder::new(self.status_code())
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .json(self.parts())
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                HttpErrorResponse::IncorrectlyFormed(_)
                | HttpErrorResponse::InputTooLong(_)
                | HttpErrorResponse::PasswordMismatch(_)
                | HttpErrorResponse::WeakPassword(_) => StatusCode::BAD_REQUEST,
                HttpErrorResponse::BadToken(_)
                | HttpErrorResponse::TokenExpired(_)
                | HttpErrorResponse::TokenMissing(_)
                | HttpErrorResponse::WrongTokenType(_)
                | HttpErrorResponse::IncorrectCode(_)
                | HttpErrorResponse::OtpExpired(_) => StatusCode::UNAUTHORIZED,
                HttpErrorResponse::TooManyAttempts(_)
                | HttpErrorResponse::Forbidden(_) => StatusCode::FORBIDDEN,
                HttpErrorResponse::DoesNotExist(_) => StatusCode::NOT_FOUND,
                HttpErrorResponse::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                HttpErrorResponse::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl From<actix_web::error::BlockingError> for HttpErrorResponse {
        fn from(_err: actix_web::error::BlockingError) -> Self {
            HttpErrorResponse::InternalError("Actix thread pool failure")
        }
    }

    impl From<oneshot::error::RecvError> for HttpErrorResponse {
        fn from(_err: oneshot::error::RecvError) -> Self {
            HttpErrorResponse::InternalError("Rayon thread pool failure")
        }
    }

    impl From<TokenError> for HttpErrorResponse {
        fn from(err: TokenError) -> Self {
            match err {
                TokenError::TokenInvalid => HttpErrorResponse::BadToken("Invalid token"),
                TokenError::TokenExpired => HttpErrorResponse::TokenExpired("Token expired"),
                TokenError::TokenMissing => HttpErrorResponse::TokenMissing("Missing token"),
                TokenError::WrongTokenType => {
                    HttpErrorResponse::WrongTokenType("Wrong token type")
                }
            }
        }
    }
}
