//! Credential format validation.
//!
//! Each function checks the shape of one user-supplied string and returns
//! either `Ok(())` or a [`ValidationError`] naming the field and reason.
//! The checks are pure and hold no state, so they can be called from any
//! number of request handlers concurrently.
//!
//! Rules:
//! - username / name: 3-32 characters from ASCII letters, digits and
//!   `!@#$%^&*()_+={}[]:;,.<>?/-`
//! - email: `local@domain.tld`, local from letters, digits and `._%+-`,
//!   domain from letters, digits and `.-`, tld at least 2 letters
//! - password: 8-32 characters from ASCII letters, digits and
//!   `_!@#$%^&*()+`, with at least one uppercase letter and one digit

use crate::errors::{CredentialField, ValidationError};

pub const MIN_IDENTIFIER_LENGTH: usize = 3;
pub const MAX_IDENTIFIER_LENGTH: usize = 32;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 32;

/// Punctuation allowed in usernames and display names, besides letters and digits.
const IDENTIFIER_SYMBOLS: &str = "!@#$%^&*()_+={}[]:;,.<>?/-";

/// Punctuation allowed in passwords, besides letters and digits.
const PASSWORD_SYMBOLS: &str = "_!@#$%^&*()+";

/// Punctuation allowed in the local part of an email address.
const EMAIL_LOCAL_SYMBOLS: &str = "._%+-";

/// Punctuation allowed in the domain part of an email address.
const EMAIL_DOMAIN_SYMBOLS: &str = ".-";

fn is_allowed(c: char, symbols: &str) -> bool {
    c.is_ascii_alphanumeric() || symbols.contains(c)
}

/// Validate a username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    validate_identifier(CredentialField::Username, username)
}

/// Validate a display name.
///
/// Uses the same rule as usernames, `@` included.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(CredentialField::Name, name)
}

fn validate_identifier(field: CredentialField, value: &str) -> Result<(), ValidationError> {
    let length = value.chars().count();
    if !(MIN_IDENTIFIER_LENGTH..=MAX_IDENTIFIER_LENGTH).contains(&length) {
        return Err(ValidationError::new(
            field,
            format!(
                "must be between {} and {} characters",
                MIN_IDENTIFIER_LENGTH, MAX_IDENTIFIER_LENGTH
            ),
        ));
    }

    if !value.chars().all(|c| is_allowed(c, IDENTIFIER_SYMBOLS)) {
        return Err(ValidationError::new(
            field,
            format!(
                "may only contain letters, digits and {}",
                IDENTIFIER_SYMBOLS
            ),
        ));
    }

    Ok(())
}

/// Validate an email address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new(CredentialField::Email, "invalid email address");

    if email.is_empty() {
        return Err(ValidationError::new(
            CredentialField::Email,
            "email cannot be empty",
        ));
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty() || !local.chars().all(|c| is_allowed(c, EMAIL_LOCAL_SYMBOLS)) {
        return Err(invalid());
    }

    // The domain alphabet excludes '@', so a second '@' fails here too.
    if !domain.chars().all(|c| is_allowed(c, EMAIL_DOMAIN_SYMBOLS)) {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    Ok(())
}

/// Validate a password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new(
            CredentialField::Password,
            "password cannot be empty",
        ));
    }

    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(ValidationError::new(
            CredentialField::Password,
            format!(
                "must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            ),
        ));
    }

    if !password.chars().all(|c| is_allowed(c, PASSWORD_SYMBOLS)) {
        return Err(ValidationError::new(
            CredentialField::Password,
            format!(
                "may only contain letters, digits and {}",
                PASSWORD_SYMBOLS
            ),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            CredentialField::Password,
            "must contain at least one uppercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            CredentialField::Password,
            "must contain at least one digit",
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        let max = "a".repeat(32);
        let cases = [
            ("valid username", "validUsername", true),
            ("too short", "a", false),
            ("two characters", "ab", false),
            ("minimum length", "abc", true),
            ("maximum length", max.as_str(), true),
            (
                "too long",
                "KSJDKFLAJDFLKJAKLDFJKSDJFKSJDKJAKLJKASJDFKJASKLDFJASKDJFKASJDFKJASDKFJ",
                false,
            ),
            ("space", "john doe", false),
            ("backslash", "john\\doe", false),
            ("pipe", "john|doe", false),
            ("tilde", "john~doe", false),
            ("quote", "john'doe", false),
            ("non-ascii letter", "jöhn", false),
            ("all symbols", "!@#$%^&*()_+={}[]:;,.<>?/-", true),
        ];

        for (name, input, ok) in cases {
            assert_eq!(validate_username(input).is_ok(), ok, "case: {}", name);
        }
    }

    #[test]
    fn test_validate_username_error_names_field() {
        let err = validate_username("a").unwrap_err();
        assert_eq!(err.field, CredentialField::Username);
        assert!(err.reason.contains("between 3 and 32"));
    }

    #[test]
    fn test_validate_name() {
        let too_long = "a".repeat(33);
        let cases = [
            ("empty string", "", false),
            ("less than 3 characters", "ab", false),
            ("more than 32 characters", too_long.as_str(), false),
            ("exclamation mark", "abc!", true),
            ("at sign", "abc@", true),
            ("valid characters", "abcdef", true),
            ("special characters", "abc!@#$%^&*()_+={}[", true),
            ("space", "ab c", false),
        ];

        for (name, input, ok) in cases {
            assert_eq!(validate_name(input).is_ok(), ok, "case: {}", name);
        }

        assert_eq!(
            validate_name("x").unwrap_err().field,
            CredentialField::Name
        );
    }

    #[test]
    fn test_identifier_single_bad_char_anywhere_rejects() {
        let base = "abcdefgh";
        for pos in 0..=base.len() {
            let mut s = base.to_string();
            s.insert(pos, ' ');
            assert!(validate_username(&s).is_err(), "space at {}", pos);
        }
    }

    #[test]
    fn test_identifier_length_counts_characters() {
        for len in 0..=40 {
            let s = "x".repeat(len);
            let expected = (3..=32).contains(&len);
            assert_eq!(validate_username(&s).is_ok(), expected, "len {}", len);
            assert_eq!(validate_name(&s).is_ok(), expected, "len {}", len);
        }
    }

    #[test]
    fn test_validate_email() {
        let cases = [
            ("valid email", "test@example.com", true),
            ("missing @", "testexample.com", false),
            ("missing domain", "test@", false),
            ("invalid characters", "test@example!com", false),
            ("empty string", "", false),
            ("subdomain", "first.last+tag@mail.example.co", true),
            ("local symbols", "a_b%c-d@x.io", true),
            ("one letter tld", "test@example.c", false),
            ("numeric tld", "test@example.c0m", false),
            ("missing local", "@example.com", false),
            ("two at signs", "a@b@example.com", false),
            ("no dot in domain", "test@localhost", false),
            ("empty host", "test@.com", false),
            ("dotted host", "a@..co", true),
            ("space in local", "te st@example.com", false),
        ];

        for (name, input, ok) in cases {
            assert_eq!(validate_email(input).is_ok(), ok, "case: {}", name);
        }
    }

    #[test]
    fn test_validate_email_empty_reason() {
        let err = validate_email("").unwrap_err();
        assert_eq!(err.field, CredentialField::Email);
        assert_eq!(err.reason, "email cannot be empty");
    }

    #[test]
    fn test_validate_password() {
        let max = format!("Aa1{}", "a".repeat(29));
        let too_long = format!("Aa1{}", "a".repeat(30));
        let cases = [
            ("valid password", "P@ssw0rd", true),
            ("no uppercase or digit", "password", false),
            ("digits only", "12345678", false),
            ("too short", "P@ss", false),
            ("seven characters", "P@ssw0r", false),
            ("maximum length", max.as_str(), true),
            ("too long", too_long.as_str(), false),
            ("empty", "", false),
            ("no digit", "Password!", false),
            ("no uppercase", "passw0rd!", false),
            ("disallowed dash", "Passw0rd-", false),
            ("disallowed space", "Pass w0rd", false),
            ("disallowed equals", "Passw0rd=", false),
            ("all symbols", "A1_!@#$%^&*()+", true),
        ];

        for (name, input, ok) in cases {
            assert_eq!(validate_password(input).is_ok(), ok, "case: {}", name);
        }
    }

    #[test]
    fn test_validate_password_reasons() {
        assert_eq!(
            validate_password("").unwrap_err().reason,
            "password cannot be empty"
        );
        assert!(validate_password("password")
            .unwrap_err()
            .reason
            .contains("uppercase"));
        assert!(validate_password("PASSWORD")
            .unwrap_err()
            .reason
            .contains("digit"));
        assert!(validate_password("P@ss")
            .unwrap_err()
            .reason
            .contains("between 8 and 32"));
    }

    #[test]
    fn test_validate_password_bad_char_wins_over_other_rules() {
        let err = validate_password("Passw0rd~").unwrap_err();
        assert!(err.reason.contains("may only contain"));
    }
}
