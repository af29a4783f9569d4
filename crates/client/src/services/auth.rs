//! Login, signup and logout.

use serde::de::IgnoredAny;
use serde::Deserialize;

use bienestar_core::access::{landing_route, Route};
use bienestar_core::session::{Session, UserProfile, UserRole};
use bienestar_core::validation::{FieldErrors, LoginForm, SignupForm};

use crate::api::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: LoginUser,
}

/// `/login` returns the profile and the tokens side by side.
#[derive(Debug, Deserialize)]
struct LoginUser {
    #[serde(flatten)]
    profile: UserProfile,
    access_token: String,
    refresh_token: String,
}

pub struct AuthApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { api: self }
    }
}

impl AuthApi<'_> {
    /// Sign in and return where the user goes next: face registration on
    /// the first login, face verification afterwards.
    pub async fn login(&self, form: &LoginForm) -> Result<Route, ApiError> {
        form.check()?;

        let response: LoginResponse = self.api.post("/login", &[], form).await?;
        let LoginUser {
            profile,
            access_token,
            refresh_token,
        } = response.user;

        let route = landing_route(&profile);
        tracing::info!(user_id = %profile.id, next = route.path(), "Login accepted");
        self.api
            .session()
            .sign_in(Session::new(profile, access_token, refresh_token))?;
        Ok(route)
    }

    /// Create an account. Students and psychologists live under different
    /// endpoints.
    pub async fn signup(&self, form: &SignupForm) -> Result<(), ApiError> {
        form.check()?;

        let path = match form.rol {
            UserRole::Student => "/usuarios/estudiantes",
            UserRole::Psychologist => "/usuarios/psicologos",
            UserRole::Unknown => {
                let mut errors = FieldErrors::new();
                errors.insert("rol", "Select a role");
                return Err(errors.into());
            }
        };

        let _: IgnoredAny = self.api.post(path, &[], form).await?;
        tracing::info!(role = form.rol.as_str(), "Account created");
        Ok(())
    }

    pub fn logout(&self) {
        self.api.session().sign_out();
    }
}
