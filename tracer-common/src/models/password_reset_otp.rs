use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::otp::Otp;
use crate::schema::password_reset_otps;

/// Outcome of checking a submitted code against a stored OTP record.
///
/// `Verified` and the failure variants map one-to-one onto the record's
/// state machine: an issued record stays issued on a wrong guess below the
/// attempt ceiling and becomes terminal once consumed, expired, or locked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OtpStatus {
    Verified,
    IncorrectCode,
    Expired,
    TooManyAttempts,
    NotFound,
}

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable)]
#[diesel(table_name = password_reset_otps, primary_key(user_email))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PasswordResetOtp {
    pub user_email: String,
    pub otp: String,
    pub created_timestamp: SystemTime,
    pub expiration: SystemTime,
    pub attempt_count: i16,
    pub max_attempts: i16,
    pub consumed: bool,
}

impl PasswordResetOtp {
    /// Walks the record's state machine for a submitted code. Pure; the
    /// caller is responsible for persisting the attempt increment or the
    /// consumed flag implied by the outcome.
    pub fn check(&self, given_otp: &str, now: SystemTime) -> OtpStatus {
        if now > self.expiration {
            return OtpStatus::Expired;
        }

        // Consumed is terminal; a consumed code never re-verifies
        if self.consumed {
            return OtpStatus::IncorrectCode;
        }

        if self.attempt_count >= self.max_attempts {
            return OtpStatus::TooManyAttempts;
        }

        if !Otp::are_equal(given_otp, &self.otp) {
            return OtpStatus::IncorrectCode;
        }

        OtpStatus::Verified
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = password_reset_otps, primary_key(user_email))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPasswordResetOtp<'a> {
    pub user_email: &'a str,
    pub otp: &'a str,
    pub created_timestamp: SystemTime,
    pub expiration: SystemTime,
    pub attempt_count: i16,
    pub max_attempts: i16,
    pub consumed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn record(attempt_count: i16, consumed: bool, expires_in: Duration) -> PasswordResetOtp {
        PasswordResetOtp {
            user_email: String::from("alice@example.com"),
            otp: String::from("123456"),
            created_timestamp: SystemTime::now(),
            expiration: SystemTime::now() + expires_in,
            attempt_count,
            max_attempts: 5,
            consumed,
        }
    }

    #[test]
    fn test_correct_code_within_window_verifies() {
        let otp = record(0, false, Duration::from_secs(600));
        assert_eq!(otp.check("123456", SystemTime::now()), OtpStatus::Verified);
    }

    #[test]
    fn test_wrong_code_is_incorrect() {
        let otp = record(0, false, Duration::from_secs(600));
        assert_eq!(
            otp.check("000000", SystemTime::now()),
            OtpStatus::IncorrectCode
        );
    }

    #[test]
    fn test_correct_code_after_expiry_is_expired() {
        let otp = record(0, false, Duration::from_secs(600));
        let after_expiry = SystemTime::now() + Duration::from_secs(601);
        assert_eq!(otp.check("123456", after_expiry), OtpStatus::Expired);
    }

    #[test]
    fn test_wrong_code_after_expiry_is_expired() {
        let otp = record(0, false, Duration::from_secs(600));
        let after_expiry = SystemTime::now() + Duration::from_secs(601);
        assert_eq!(otp.check("000000", after_expiry), OtpStatus::Expired);
    }

    #[test]
    fn test_attempt_ceiling_locks_out_correct_code() {
        let otp = record(5, false, Duration::from_secs(600));
        assert_eq!(
            otp.check("123456", SystemTime::now()),
            OtpStatus::TooManyAttempts
        );
    }

    #[test]
    fn test_below_attempt_ceiling_still_verifies() {
        let otp = record(4, false, Duration::from_secs(600));
        assert_eq!(otp.check("123456", SystemTime::now()), OtpStatus::Verified);
    }

    #[test]
    fn test_consumed_code_does_not_verify_again() {
        let otp = record(1, true, Duration::from_secs(600));
        assert_eq!(
            otp.check("123456", SystemTime::now()),
            OtpStatus::IncorrectCode
        );
    }
}
