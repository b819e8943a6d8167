use super::surface;
use crate::app::AppContext;
use crate::backend::{AuthUser, Credentials};
use crate::error::{AppError, AppResult};

pub const GOOGLE_PROVIDER: &str = "google.com";

/// Loose shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}

#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> AppResult<Credentials> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(AppError::validation("Please enter both email and password"));
        }
        if !is_valid_email(email) {
            return Err(AppError::validation("Invalid email format"));
        }
        Ok(Credentials::new(email, self.password.as_str()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> AppResult<Credentials> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() || self.confirm_password.is_empty() {
            return Err(AppError::validation("Please fill in all fields"));
        }
        if self.password != self.confirm_password {
            return Err(AppError::validation("Passwords do not match"));
        }
        Ok(Credentials::new(email, self.password.as_str()))
    }
}

pub struct AccountScreen {
    ctx: AppContext,
}

impl AccountScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.ctx.backend.auth.current_user()
    }

    pub async fn login(&self, form: &LoginForm) -> AppResult<AuthUser> {
        let credentials = surface(&self.ctx.notices, form.validate())?;
        let user = surface(
            &self.ctx.notices,
            self.ctx.backend.auth.sign_in(&credentials).await,
        )?;
        self.ctx.notices.info("Login successful");
        Ok(user)
    }

    pub async fn register(&self, form: &RegisterForm) -> AppResult<AuthUser> {
        let credentials = surface(&self.ctx.notices, form.validate())?;
        let user = surface(
            &self.ctx.notices,
            self.ctx.backend.auth.register(&credentials).await,
        )?;
        self.ctx.notices.info("Account created!");
        Ok(user)
    }

    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return surface(
                &self.ctx.notices,
                Err(AppError::validation("Please enter your email")),
            );
        }
        surface(
            &self.ctx.notices,
            self.ctx.backend.auth.send_password_reset(email).await,
        )?;
        self.ctx.notices.info("Reset link sent. Check your inbox.");
        Ok(())
    }

    /// Completes a Google sign-in with the id token the platform flow returned.
    pub async fn sign_in_with_google(&self, id_token: &str) -> AppResult<AuthUser> {
        let user = surface(
            &self.ctx.notices,
            self.ctx
                .backend
                .auth
                .sign_in_with_idp(GOOGLE_PROVIDER, id_token)
                .await,
        )?;
        self.ctx.notices.info("Google Sign-In successful");
        Ok(user)
    }

    pub fn sign_out(&self) {
        self.ctx.backend.auth.sign_out();
        tracing::info!("signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("kwamboka@omni.bot"));
        assert!(!is_valid_email("kwamboka"));
        assert!(!is_valid_email("@omni.bot"));
        assert!(!is_valid_email("k@omnibot"));
        assert!(!is_valid_email("k@omni."));
        assert!(!is_valid_email("k w@omni.bot"));
    }

    #[test]
    fn test_login_validation_order() {
        let empty = LoginForm::default();
        assert_eq!(
            empty.validate().unwrap_err().user_message(),
            "Please enter both email and password"
        );
        let bad = LoginForm {
            email: "nope".into(),
            password: "pw".into(),
        };
        assert_eq!(bad.validate().unwrap_err().user_message(), "Invalid email format");
    }

    #[test]
    fn test_register_requires_matching_passwords() {
        let form = RegisterForm {
            email: "a@b.co".into(),
            password: "one".into(),
            confirm_password: "two".into(),
        };
        assert_eq!(form.validate().unwrap_err().user_message(), "Passwords do not match");
    }
}
