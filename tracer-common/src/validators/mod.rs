#[derive(Debug)]
pub enum Validity {
    Valid,
    Invalid(&'static str),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        match &self {
            Validity::Valid => true,
            Validity::Invalid(_) => false,
        }
    }
}

// Passwords matching one of these (case-insensitively) are rejected no matter
// how long they are.
const COMMON_PASSWORDS: [&str; 12] = [
    "password",
    "password1",
    "password123",
    "passwordpassword",
    "qwertyuiop",
    "1234567890",
    "123456789012",
    "iloveyou123",
    "letmein12345",
    "adminadmin",
    "welcome12345",
    "changeme1234",
];

// The RFC 3696 ceiling. Everything that length-checks an email address must
// use this bound so an address accepted at issuance is also accepted at
// verification.
pub const MAX_EMAIL_LENGTH: usize = 320;

pub fn validate_email_address(email: &str) -> Validity {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Validity::Invalid("Email address is too long.");
    }

    for c in email.chars() {
        if c == ' ' || !c.is_ascii() {
            return Validity::Invalid("Email address cannot contain a space.");
        }
    }

    if email.contains("@.") {
        return Validity::Invalid("Domain name in email address cannot begin with a period.");
    }

    let email = match email.split_once('@') {
        Some(s) => s,
        None => return Validity::Invalid("Email address must contain an at symbol (@)."),
    };

    if email.0.is_empty() || email.1.len() < 3 {
        return Validity::Invalid("Email username or domain name is too short.");
    }

    if email.1.contains('@') || !email.1.contains('.') {
        return Validity::Invalid(
            "Email address must have only one at symbol (@) and the domain must contain a period.",
        );
    }

    if email.1.ends_with('.') {
        return Validity::Invalid("Email address cannot end with a period.");
    }

    Validity::Valid
}

pub fn validate_new_password(password: &str, min_length: usize) -> Validity {
    if password.chars().count() < min_length {
        return Validity::Invalid("Password is too short.");
    }

    let mut has_letter = false;
    let mut has_digit = false;

    for c in password.chars() {
        if c.is_alphabetic() {
            has_letter = true;
        } else if c.is_numeric() {
            has_digit = true;
        }

        if has_letter && has_digit {
            break;
        }
    }

    if !has_letter || !has_digit {
        return Validity::Invalid("Password must contain both letters and numbers.");
    }

    let lowercased = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowercased.as_str()) {
        return Validity::Invalid("Password is too common.");
    }

    Validity::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{distributions::Alphanumeric, Rng};

    #[test]
    fn test_validate_email_address() {
        // Valid
        const NORMAL: &str = "test@example.com";
        const WITH_DOT_IN_USERNAME: &str = "test.me@example.com";
        const MULTIPLE_DOT_DOMAIN: &str = "email@example.co.jp";
        const PLUS_IN_USERNAME: &str = "firstname+lastname@example.com";
        const IP_DOMAIN: &str = "email@123.123.123.123";
        const NUMERIC_USERNAME: &str = "1234567890@example.co.uk";
        const DASH_IN_DOMAIN: &str = "email@example-one.com";
        const DASH_IN_USERNAME: &str = "firstname-lastname@example.com";

        assert!(validate_email_address(NORMAL).is_valid());
        assert!(validate_email_address(WITH_DOT_IN_USERNAME).is_valid());
        assert!(validate_email_address(MULTIPLE_DOT_DOMAIN).is_valid());
        assert!(validate_email_address(PLUS_IN_USERNAME).is_valid());
        assert!(validate_email_address(IP_DOMAIN).is_valid());
        assert!(validate_email_address(NUMERIC_USERNAME).is_valid());
        assert!(validate_email_address(DASH_IN_DOMAIN).is_valid());
        assert!(validate_email_address(DASH_IN_USERNAME).is_valid());

        // Long but within the RFC ceiling
        let mut long_but_valid = "a".repeat(MAX_EMAIL_LENGTH - "@example.com".len());
        long_but_valid.push_str("@example.com");
        assert_eq!(long_but_valid.len(), MAX_EMAIL_LENGTH);
        assert!(validate_email_address(&long_but_valid).is_valid());

        // Invalid
        let mut too_long: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(255)
            .map(char::from)
            .collect();

        too_long.push('@');
        too_long.push_str(
            "thisisareallyreallylongdomainnamethatwillmaketheaddressinvalidbecauseitisjustlong",
        );
        too_long.push_str(".com");
        too_long.push_str(&"a".repeat(320));

        const WITH_SPACE: &str = "te st@example.com";
        const MULTIPLE_AT: &str = "test@exam.com@ple.com";
        const NO_AT: &str = "testexample.com";
        const DOMAIN_DOT_ADJACENT_TO_AT: &str = "test@.com";
        const DOT_LAST_CHAR: &str = "test@example.com.";

        assert!(!validate_email_address(&too_long).is_valid());
        assert!(!validate_email_address(WITH_SPACE).is_valid());
        assert!(!validate_email_address(MULTIPLE_AT).is_valid());
        assert!(!validate_email_address(NO_AT).is_valid());
        assert!(!validate_email_address(DOMAIN_DOT_ADJACENT_TO_AT).is_valid());
        assert!(!validate_email_address(DOT_LAST_CHAR).is_valid());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("c0rrecthorse88", 12).is_valid());
        assert!(validate_new_password("a1a1a1a1a1a1", 12).is_valid());

        // Too short
        assert!(!validate_new_password("sh0rt", 12).is_valid());
        assert!(!validate_new_password("elevenchar1", 12).is_valid());

        // Missing letters or digits
        assert!(!validate_new_password("onlylettershere", 12).is_valid());
        assert!(!validate_new_password("111222333444555", 12).is_valid());

        // Common passwords, regardless of case
        assert!(!validate_new_password("password123", 8).is_valid());
        assert!(!validate_new_password("PASSWORD123", 8).is_valid());
    }
}
