//! Navigation targets and the route guard.
//!
//! After login the user must pass the face check before reaching the
//! role's home; [`authorize`] enforces that together with role
//! restrictions on each protected area.

use crate::session::{Session, UserProfile, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    FaceRegister,
    FaceVerify,
    StudentHome,
    PsychologistHome,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::FaceRegister => "/face-register",
            Route::FaceVerify => "/face-verify",
            Route::StudentHome => "/student",
            Route::PsychologistHome => "/psychologist",
        }
    }
}

/// Home area for a role.
pub fn home_route(role: UserRole) -> Route {
    match role {
        UserRole::Student => Route::StudentHome,
        UserRole::Psychologist => Route::PsychologistHome,
        UserRole::Unknown => Route::Home,
    }
}

/// Where to send a user right after a successful login.
pub fn landing_route(user: &UserProfile) -> Route {
    if user.has_face_registered() {
        Route::FaceVerify
    } else {
        Route::FaceRegister
    }
}

/// Outcome of the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(Route),
}

/// Guard a protected area restricted to `allowed` roles.
///
/// An empty `allowed` slice admits any signed-in, face-verified user.
pub fn authorize(session: Option<&Session>, allowed: &[UserRole]) -> Access {
    let Some(session) = session else {
        return Access::Redirect(Route::Login);
    };
    if !session.face_verified {
        return Access::Redirect(landing_route(&session.user));
    }
    if !allowed.is_empty() && !allowed.contains(&session.user.rol) {
        return Access::Redirect(home_route(session.user.rol));
    }
    Access::Granted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole, photo: Option<&str>, verified: bool) -> Session {
        let mut session = Session::new(
            UserProfile {
                id: "u-1".into(),
                email: "x@uni.edu.pe".into(),
                rol: role,
                nombre: "X".into(),
                apellido: None,
                codigo_alumno: None,
                foto_perfil_url: photo.map(str::to_string),
            },
            "a".into(),
            "r".into(),
        );
        session.face_verified = verified;
        session
    }

    #[test]
    fn landing_depends_on_registered_face() {
        let fresh = session(UserRole::Student, None, false);
        assert_eq!(landing_route(&fresh.user), Route::FaceRegister);

        let known = session(UserRole::Student, Some("https://cdn/p.jpg"), false);
        assert_eq!(landing_route(&known.user), Route::FaceVerify);
    }

    #[test]
    fn empty_photo_url_means_no_registered_face() {
        let user: UserProfile = serde_json::from_value(serde_json::json!({
            "id": "u-2",
            "email": "luis@uni.edu.pe",
            "rol": "estudiante",
            "nombre": "Luis",
            "foto_perfil_url": ""
        }))
        .unwrap();
        assert_eq!(landing_route(&user), Route::FaceRegister);

        let blank = session(UserRole::Student, Some("  "), false);
        assert_eq!(landing_route(&blank.user), Route::FaceRegister);
    }

    #[test]
    fn anonymous_goes_to_login() {
        assert_eq!(
            authorize(None, &[UserRole::Student]),
            Access::Redirect(Route::Login)
        );
    }

    #[test]
    fn unverified_goes_to_face_check() {
        let s = session(UserRole::Student, Some("p"), false);
        assert_eq!(authorize(Some(&s), &[]), Access::Redirect(Route::FaceVerify));
    }

    #[test]
    fn wrong_role_goes_home() {
        let s = session(UserRole::Student, Some("p"), true);
        assert_eq!(
            authorize(Some(&s), &[UserRole::Psychologist]),
            Access::Redirect(Route::StudentHome)
        );
    }

    #[test]
    fn matching_role_is_granted() {
        let s = session(UserRole::Psychologist, Some("p"), true);
        assert_eq!(authorize(Some(&s), &[UserRole::Psychologist]), Access::Granted);
        assert_eq!(home_route(UserRole::Psychologist).path(), "/psychologist");
    }
}
