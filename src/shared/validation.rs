//! Input Validation
//!
//! Field validators for registration and conversation input. Each returns
//! `Ok(())` or a [`SharedError::ValidationError`] whose message is sent to
//! the client unchanged.

use crate::shared::error::SharedError;

/// Minimum length of a user name
pub const USER_NAME_MIN_LEN: usize = 5;
/// Maximum length of a user name
pub const USER_NAME_MAX_LEN: usize = 30;
/// Maximum length of first and last names
pub const PERSON_NAME_MAX_LEN: usize = 30;
/// Minimum password length
pub const PASSWORD_MIN_LEN: usize = 8;
/// Maximum conversation title length
pub const TITLE_MAX_LEN: usize = 255;

const EMAIL_MAX_LEN: usize = 254;
const EMAIL_LOCAL_MAX_LEN: usize = 64;
const EMAIL_LOCAL_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

/// Validate the length of a user name
///
/// Kept separate from [`validate_user_name_charset`] because the length
/// rule is reported before the character rule.
pub fn validate_user_name_length(user_name: &str) -> Result<(), SharedError> {
    let len = user_name.chars().count();
    if len < USER_NAME_MIN_LEN {
        return Err(SharedError::validation(
            "user_name",
            format!("Username must be at least {USER_NAME_MIN_LEN} characters long"),
        ));
    }
    if len > USER_NAME_MAX_LEN {
        return Err(SharedError::validation(
            "user_name",
            format!("Username must be at most {USER_NAME_MAX_LEN} characters long"),
        ));
    }
    Ok(())
}

/// Validate that a user name is made of English letters and digits only
pub fn validate_user_name_charset(user_name: &str) -> Result<(), SharedError> {
    if user_name.is_empty() || !user_name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SharedError::validation(
            "user_name",
            "Username must consist of only English letters And without any spaces",
        ));
    }
    Ok(())
}

/// Validate a user name (length, then character set)
pub fn validate_user_name(user_name: &str) -> Result<(), SharedError> {
    validate_user_name_length(user_name)?;
    validate_user_name_charset(user_name)
}

/// Validate the shape of an email address
///
/// Accepts `local@domain` where the local part is a dot-atom and the
/// domain has at least two labels. Quoted local parts and IP-literal
/// domains are rejected.
pub fn validate_email(email: &str) -> Result<(), SharedError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(SharedError::validation("email", "Invalid email format"))
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LEN {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    if local.is_empty() || local.len() > EMAIL_LOCAL_MAX_LEN {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || EMAIL_LOCAL_SPECIALS.contains(c))
}

fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    // Top-level domain must not be numeric
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().any(|c| c.is_ascii_alphabetic()));

    labels_ok && tld_ok
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), SharedError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(SharedError::validation(
            "password",
            format!("Password must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validate a first or last name
///
/// `label` is the human name of the field ("First name", "Last name").
pub fn validate_person_name(field: &str, label: &str, value: &str) -> Result<(), SharedError> {
    if value.chars().count() > PERSON_NAME_MAX_LEN {
        return Err(SharedError::validation(
            field,
            format!("{label} must be at most {PERSON_NAME_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validate a conversation title
pub fn validate_title(title: &str) -> Result<(), SharedError> {
    let len = title.trim().chars().count();
    if len == 0 || title.chars().count() > TITLE_MAX_LEN {
        return Err(SharedError::validation(
            "title",
            format!("Title must be between 1 and {TITLE_MAX_LEN} characters"),
        ));
    }
    Ok(())
}
