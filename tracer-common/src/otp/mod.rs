use rand::Rng;

use crate::threadrand::SecureRng;

/// Length of the numeric codes sent to users' email addresses.
pub const OTP_LENGTH: usize = 6;

pub struct Otp {}

impl Otp {
    pub fn generate(length: usize) -> String {
        let mut rng = SecureRng;
        (0..length)
            .map(|_| (b'0' + rng.gen_range(0..10)) as char)
            .collect()
    }

    pub fn are_equal(given: &str, saved: &str) -> bool {
        let given = given.as_bytes();
        let saved = saved.as_bytes();

        if given.len() != saved.len() {
            return false;
        }

        let mut otps_dont_match = 0u8;

        // Bitwise comparison to prevent timing attacks
        for (given_byte, saved_byte) in given.iter().zip(saved.iter()) {
            otps_dont_match |= given_byte ^ saved_byte;
        }

        otps_dont_match == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_numeric() {
        let otp = Otp::generate(OTP_LENGTH);
        assert_eq!(otp.len(), OTP_LENGTH);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_verify() {
        let otp = Otp::generate(OTP_LENGTH);

        // Same length, guaranteed different digits
        let wrong_otp: String = otp
            .bytes()
            .map(|b| (b'0' + (b - b'0' + 1) % 10) as char)
            .collect();

        assert!(Otp::are_equal(&otp, &otp));
        assert!(!Otp::are_equal(&otp, &wrong_otp));
        assert!(!Otp::are_equal(&otp, &otp[..OTP_LENGTH - 1]));

        let mut longer_otp = String::from(&otp);
        longer_otp.push('9');
        assert!(!Otp::are_equal(&otp, &longer_otp));
    }
}
