use axum_extra::extract::cookie::{Cookie, SameSite};

const MAX_AGE: time::Duration = time::Duration::days(1);

/// The session cookie carrying a freshly issued token.
pub fn session_cookie(name: &str, token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(MAX_AGE)
        .build()
}

/// A cookie that, once added to a jar, instructs the client to forget the session.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), "")).path("/").build()
}
