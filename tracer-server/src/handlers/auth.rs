use actix_web::{web, HttpResponse};
use argon2_kdf::{Hasher, Secret};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;
use tracer_common::db::{self, DaoError, DbThreadPool};
use tracer_common::email::{templates::PasswordChangedMessage, EmailMessage, EmailSender};
use tracer_common::request_io::{
    InputEmail, InputNewPassword, InputOtp, OutputResetToken, OutputStatus,
};
use tracer_common::token::auth_token::{AuthToken, AuthTokenType, NewAuthTokenClaims};
use tracer_common::validators::{self, Validity};
use zeroize::Zeroizing;

use crate::env;
use crate::handlers::error::HttpErrorResponse;
use crate::handlers::verification;
use crate::middleware::auth::{PasswordReset, UnverifiedToken};
use crate::middleware::throttle::Throttle;
use crate::middleware::FromHeader;

pub async fn request_password_reset_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    smtp_thread_pool: web::Data<EmailSender>,
    input_email: web::Json<InputEmail>,
    throttle: Throttle<5, 1>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let email = input_email.email.to_lowercase();

    if let Validity::Invalid(msg) = validators::validate_email_address(&email) {
        return Err(HttpErrorResponse::IncorrectlyFormed(msg));
    }

    throttle
        .enforce(&email, "request_password_reset_otp", &db_thread_pool)
        .await?;

    let email_copy = email.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    let user = match web::block(move || user_dao.get_user_by_email(&email_copy)).await? {
        Ok(u) => Some(u),
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => None,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError("Failed to look up user"));
        }
    };

    // An OTP is generated and sent only when the account exists, but the
    // response is identical either way to prevent user enumeration
    if user.is_some() {
        verification::generate_and_email_otp(&email, &db_thread_pool, &smtp_thread_pool).await?;
    }

    Ok(HttpResponse::Ok().json(OutputStatus { status: "sent" }))
}

pub async fn verify_password_reset_otp(
    db_thread_pool: web::Data<DbThreadPool>,
    input_otp: web::Json<InputOtp>,
    throttle: Throttle<5, 1>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let email = input_otp.email.to_lowercase();

    if let Validity::Invalid(msg) = validators::validate_email_address(&email) {
        return Err(HttpErrorResponse::IncorrectlyFormed(msg));
    }

    throttle
        .enforce(&email, "verify_password_reset_otp", &db_thread_pool)
        .await?;

    // The user is looked up before the OTP check so a code is never consumed
    // for an account that no longer exists. A missing account is reported the
    // same way as a wrong code to prevent user enumeration.
    let email_copy = email.clone();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    let user = match web::block(move || user_dao.get_user_by_email(&email_copy)).await? {
        Ok(u) => u,
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            return Err(HttpErrorResponse::IncorrectCode("OTP was incorrect"));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError("Failed to look up user"));
        }
    };

    verification::verify_otp(&email, &input_otp.otp, &db_thread_pool).await?;

    let expiration = SystemTime::now() + env::CONF.reset_token_lifetime;
    let expiration = expiration
        .duration_since(UNIX_EPOCH)
        .map_err(|_| HttpErrorResponse::InternalError("Failed to compute token expiration"))?
        .as_secs();

    let claims = NewAuthTokenClaims {
        user_id: user.id,
        user_email: &user.email,
        user_role: user.role(),
        expiration,
        token_type: AuthTokenType::PasswordReset,
    };

    let reset_token = AuthToken::sign_new(claims, &env::CONF.token_signing_key);

    Ok(HttpResponse::Ok().json(OutputResetToken { reset_token }))
}

pub async fn reset_password(
    db_thread_pool: web::Data<DbThreadPool>,
    smtp_thread_pool: web::Data<EmailSender>,
    reset_token: UnverifiedToken<PasswordReset, FromHeader>,
    input_password: web::Json<InputNewPassword>,
    throttle: Throttle<5, 1>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let claims = reset_token.verify()?;

    throttle
        .enforce(&claims.user_email, "reset_password", &db_thread_pool)
        .await?;

    if input_password.new_password != input_password.new_password_confirmation {
        return Err(HttpErrorResponse::PasswordMismatch(
            "New password does not match confirmation",
        ));
    }

    if input_password.new_password.len() > 512 {
        return Err(HttpErrorResponse::InputTooLong("Password is too long"));
    }

    if let Validity::Invalid(msg) = validators::validate_new_password(
        &input_password.new_password,
        env::CONF.min_password_length,
    ) {
        return Err(HttpErrorResponse::WeakPassword(msg));
    }

    let new_password = Zeroizing::new(input_password.new_password.clone());
    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let hash_result = Hasher::default()
            .algorithm(argon2_kdf::Algorithm::Argon2id)
            .salt_length(env::CONF.hash_salt_length)
            .hash_length(env::CONF.hash_length)
            .iterations(env::CONF.hash_iterations)
            .memory_cost_kib(env::CONF.hash_mem_cost_kib)
            .threads(env::CONF.hash_threads)
            .secret(Secret::using(&env::CONF.hashing_key))
            .hash(new_password.as_bytes());

        sender.send(hash_result).expect("Sending to channel failed");
    });

    let hash = match receiver.await? {
        Ok(h) => h,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError("Failed to hash password"));
        }
    };

    let email_copy = claims.user_email.clone();
    let hash_string = hash.to_string();
    let user_dao = db::user::Dao::new(&db_thread_pool);
    match web::block(move || user_dao.update_password_hash(&email_copy, &hash_string)).await? {
        Ok(_) => (),
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            return Err(HttpErrorResponse::DoesNotExist("User not found"));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(
                "Failed to update password",
            ));
        }
    };

    // The OTP record has served its purpose. Failing to delete it is not
    // fatal; the consumed flag already prevents reuse.
    let email_copy = claims.user_email.clone();
    let auth_dao = db::auth::Dao::new(&db_thread_pool);
    match web::block(move || auth_dao.delete_otp(&email_copy)).await? {
        Ok(_) => (),
        Err(e) => log::error!("{e}"),
    };

    let message = EmailMessage {
        body: PasswordChangedMessage::generate(),
        subject: "Your password was changed",
        from: env::CONF.email_from_address.clone(),
        reply_to: env::CONF.email_reply_to_address.clone(),
        destination: &claims.user_email,
        is_html: true,
    };

    if let Err(e) = smtp_thread_pool.send(message).await {
        log::error!("{e}");
    }

    Ok(HttpResponse::Ok().json(OutputStatus { status: "reset" }))
}
