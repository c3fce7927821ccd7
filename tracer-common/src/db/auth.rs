use diesel::{dsl, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use std::time::SystemTime;

use crate::db::{DaoError, DbThreadPool};
use crate::models::password_reset_otp::{NewPasswordResetOtp, OtpStatus, PasswordResetOtp};
use crate::schema::password_reset_otps as otp_fields;
use crate::schema::password_reset_otps::dsl::password_reset_otps;

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    /// Issues a fresh OTP for the email. A single row is kept per email,
    /// so issuing supersedes any previously active code and resets the
    /// attempt counter and consumed flag.
    pub fn save_otp(
        &self,
        user_email: &str,
        otp: &str,
        max_attempts: i16,
        expiration: SystemTime,
    ) -> Result<(), DaoError> {
        let now = SystemTime::now();

        let new_otp = NewPasswordResetOtp {
            user_email,
            otp,
            created_timestamp: now,
            expiration,
            attempt_count: 0,
            max_attempts,
            consumed: false,
        };

        dsl::insert_into(password_reset_otps)
            .values(&new_otp)
            .on_conflict(otp_fields::user_email)
            .do_update()
            .set((
                otp_fields::otp.eq(otp),
                otp_fields::created_timestamp.eq(now),
                otp_fields::expiration.eq(expiration),
                otp_fields::attempt_count.eq(0),
                otp_fields::max_attempts.eq(max_attempts),
                otp_fields::consumed.eq(false),
            ))
            .execute(&mut self.db_thread_pool.get()?)?;

        Ok(())
    }

    /// Checks a submitted code and applies the resulting state transition
    /// (attempt increment or consumed flag) in the same transaction. The
    /// row is locked for the duration so concurrent guesses against one
    /// record serialize on the attempt counter rather than racing past it.
    pub fn verify_and_consume_otp(
        &self,
        user_email: &str,
        given_otp: &str,
    ) -> Result<OtpStatus, DaoError> {
        let mut db_connection = self.db_thread_pool.get()?;

        let status = db_connection
            .build_transaction()
            .run::<_, diesel::result::Error, _>(|conn| {
                let record = password_reset_otps
                    .find(user_email)
                    .for_update()
                    .get_result::<PasswordResetOtp>(conn)
                    .optional()?;

                let Some(record) = record else {
                    return Ok(OtpStatus::NotFound);
                };

                let status = record.check(given_otp, SystemTime::now());

                match status {
                    OtpStatus::IncorrectCode if !record.consumed => {
                        dsl::update(password_reset_otps.find(user_email))
                            .set(otp_fields::attempt_count.eq(record.attempt_count + 1))
                            .execute(conn)?;
                    }
                    OtpStatus::Verified => {
                        dsl::update(password_reset_otps.find(user_email))
                            .set(otp_fields::consumed.eq(true))
                            .execute(conn)?;
                    }
                    _ => (),
                }

                Ok(status)
            })?;

        Ok(status)
    }

    pub fn delete_otp(&self, user_email: &str) -> Result<(), DaoError> {
        diesel::delete(password_reset_otps.find(user_email))
            .execute(&mut self.db_thread_pool.get()?)?;

        Ok(())
    }

    pub fn delete_all_expired_otps(&self) -> Result<usize, DaoError> {
        Ok(
            dsl::delete(password_reset_otps.filter(otp_fields::expiration.lt(SystemTime::now())))
                .execute(&mut self.db_thread_pool.get()?)?,
        )
    }
}
