//! Shape checks for request bodies and path parameters.
//!
//! Every check runs, and all failures are reported together as
//! `"field: reason"` strings inside a 400 `Validation error` response.

use acquisitions_core::{Role, UserId};

use crate::dto::{SignInRequest, SignUpRequest, UpdateUserRequest};
use crate::error::AppError;

const NAME_MIN: usize = 2;
const MAX_LEN: usize = 255;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 128;

#[derive(Debug)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct Update {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Default)]
struct Details(Vec<String>);

impl Details {
    fn push(&mut self, field: &str, reason: &str) {
        self.0.push(format!("{field}: {reason}"));
    }

    fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

pub fn user_id(raw: &str) -> Result<UserId, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(UserId::new(id)),
        _ => Err(AppError::Validation(vec![
            "id: Id must be a positive integer".to_string(),
        ])),
    }
}

pub fn sign_up(req: SignUpRequest) -> Result<SignUp, AppError> {
    let mut details = Details::default();
    let name = req.name.unwrap_or_default().trim().to_string();
    check_name(&name, &mut details);
    let email = normalize_email(req.email);
    check_email(&email, &mut details);
    let password = req.password.unwrap_or_default();
    check_password(&password, &mut details);

    details.finish(SignUp { name, email, password })
}

pub fn sign_in(req: SignInRequest) -> Result<SignIn, AppError> {
    let mut details = Details::default();
    let email = normalize_email(req.email);
    check_email(&email, &mut details);
    let password = req.password.unwrap_or_default();
    if password.is_empty() {
        details.push("password", "Password is required");
    }

    details.finish(SignIn { email, password })
}

pub fn update(req: UpdateUserRequest) -> Result<Update, AppError> {
    let mut details = Details::default();
    let mut update = Update::default();

    if req.name.is_none() && req.email.is_none() && req.password.is_none() && req.role.is_none() {
        details.push("body", "At least one field must be provided for update");
    }

    if let Some(name) = req.name {
        let name = name.trim().to_string();
        check_name(&name, &mut details);
        update.name = Some(name);
    }
    if let Some(email) = req.email {
        let email = normalize_email(Some(email));
        check_email(&email, &mut details);
        update.email = Some(email);
    }
    if let Some(password) = req.password {
        check_password(&password, &mut details);
        update.password = Some(password);
    }
    if let Some(role) = req.role {
        match role.parse::<Role>() {
            Ok(role @ (Role::User | Role::Admin)) => update.role = Some(role),
            _ => details.push("role", "Role must be either user or admin"),
        }
    }

    details.finish(update)
}

fn normalize_email(raw: Option<String>) -> String {
    raw.unwrap_or_default().trim().to_lowercase()
}

fn check_name(name: &str, details: &mut Details) {
    let len = name.chars().count();
    if len < NAME_MIN {
        details.push("name", "Name must be at least 2 characters");
    } else if len > MAX_LEN {
        details.push("name", "Name must be at most 255 characters");
    }
}

fn check_email(email: &str, details: &mut Details) {
    if email.chars().count() > MAX_LEN {
        details.push("email", "Email must be at most 255 characters");
    } else if !is_valid_email(email) {
        details.push("email", "Invalid email address");
    }
}

fn check_password(password: &str, details: &mut Details) {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        details.push("password", "Password must be at least 6 characters");
    } else if len > PASSWORD_MAX {
        details.push("password", "Password must be at most 128 characters");
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation(details) => details,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn user_id_must_be_positive_integer() {
        assert_eq!(user_id("42").unwrap(), UserId::new(42));
        for bad in ["0", "-3", "abc", "", "4.2"] {
            assert!(user_id(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn sign_up_normalizes_fields() {
        let valid = sign_up(SignUpRequest {
            name: Some("  Grace Hopper ".into()),
            email: Some(" Grace@Navy.MIL ".into()),
            password: Some("cobol!".into()),
        })
        .unwrap();
        assert_eq!(valid.name, "Grace Hopper");
        assert_eq!(valid.email, "grace@navy.mil");
    }

    #[test]
    fn sign_up_reports_every_problem() {
        let err = sign_up(SignUpRequest {
            name: Some("G".into()),
            email: Some("not-an-email".into()),
            password: Some("123".into()),
        })
        .unwrap_err();
        let details = details(err);
        assert_eq!(details.len(), 3);
        assert!(details[0].starts_with("name:"));
        assert!(details[1].starts_with("email:"));
        assert!(details[2].starts_with("password:"));
    }

    #[test]
    fn sign_up_with_missing_fields_is_invalid() {
        assert_eq!(details(sign_up(SignUpRequest::default()).unwrap_err()).len(), 3);
    }

    #[test]
    fn sign_in_needs_a_password() {
        let err = sign_in(SignInRequest {
            email: Some("a@b.io".into()),
            password: Some(String::new()),
        })
        .unwrap_err();
        assert_eq!(details(err), vec!["password: Password is required"]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = update(UpdateUserRequest::default()).unwrap_err();
        assert_eq!(
            details(err),
            vec!["body: At least one field must be provided for update"]
        );
    }

    #[test]
    fn update_role_must_be_user_or_admin() {
        let ok = update(UpdateUserRequest {
            role: Some("Admin".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ok.role, Some(Role::Admin));

        for bad in ["guest", "root"] {
            let err = update(UpdateUserRequest {
                role: Some(bad.into()),
                ..Default::default()
            })
            .unwrap_err();
            assert_eq!(details(err), vec!["role: Role must be either user or admin"]);
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.io"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        for bad in ["", "a@", "@b.io", "a@b", "a@@b.io", "a b@c.io", "a@b..io"] {
            assert!(!is_valid_email(bad), "{bad:?} should be invalid");
        }
    }
}
