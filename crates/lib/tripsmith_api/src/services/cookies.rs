//! Cookie service: set and clear httpOnly auth cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tripsmith_core::models::auth::TokenPair;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

fn auth_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Build a httpOnly cookie for the access token.
pub fn access_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    auth_cookie(
        ACCESS_COOKIE,
        token.to_string(),
        Duration::seconds(max_age_secs),
        secure,
    )
}

/// Build a httpOnly cookie for the refresh token.
pub fn refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    auth_cookie(
        REFRESH_COOKIE,
        token.to_string(),
        Duration::seconds(max_age_secs),
        secure,
    )
}

/// Add both token cookies for a freshly issued pair.
pub fn with_tokens(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(access_cookie(
        &tokens.access_token,
        tokens.access_expires_in,
        secure,
    ))
    .add(refresh_cookie(
        &tokens.refresh_token,
        tokens.refresh_expires_in,
        secure,
    ))
}

/// Expire both token cookies.
pub fn cleared(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(auth_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, secure))
        .add(auth_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, secure))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_attributes() {
        let cookie = access_cookie("tok", 900, true);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(900)));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let jar = cleared(CookieJar::new(), false);
        let refresh = jar.get(REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.value(), "");
        assert_eq!(refresh.max_age(), Some(Duration::ZERO));
        assert_eq!(refresh.secure(), Some(false));
    }
}
