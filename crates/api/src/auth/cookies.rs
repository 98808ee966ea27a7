//! Session cookie transport.
//!
//! Two cookies travel together: the `HttpOnly` session cookie carrying the
//! signed token, and a script-readable "logged in" flag the frontend uses to
//! decide what to render. Both share the same `Max-Age` and are cleared
//! together.

use std::convert::Infallible;

use axum::http::header::{InvalidHeaderValue, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};

/// Reads the session cookie from requests and writes `Set-Cookie` headers.
#[derive(Debug, Clone)]
pub struct CookieTransport {
    session_name: String,
    flag_name: String,
    secure: bool,
}

impl CookieTransport {
    /// Cookie names must be non-empty RFC 6265 tokens.
    pub fn new(
        session_name: impl Into<String>,
        flag_name: impl Into<String>,
        secure: bool,
    ) -> Result<Self, String> {
        let session_name = session_name.into();
        let flag_name = flag_name.into();
        for name in [&session_name, &flag_name] {
            if !is_cookie_name(name) {
                return Err(format!("invalid cookie name `{name}`"));
            }
        }
        if session_name == flag_name {
            return Err("session and logged-in cookies must have different names".into());
        }
        Ok(Self {
            session_name,
            flag_name,
            secure,
        })
    }

    /// Start a jar for one request, holding the session token it presented.
    pub fn read(&self, headers: &HeaderMap) -> SessionCookies {
        let token = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .find_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                (key.trim() == self.session_name).then(|| val.trim().to_string())
            })
            .filter(|t| !t.is_empty());

        SessionCookies {
            token,
            set_cookies: Vec::new(),
        }
    }

    /// Queue both cookies for `token`, living `max_age_secs`.
    pub fn set(
        &self,
        jar: &mut SessionCookies,
        token: &str,
        max_age_secs: i64,
    ) -> Result<(), InvalidHeaderValue> {
        let session = self.format(&self.session_name, token, max_age_secs, true);
        let flag = self.format(&self.flag_name, "true", max_age_secs, false);

        let session = HeaderValue::from_str(&session)?;
        let flag = HeaderValue::from_str(&flag)?;
        jar.set_cookies.push(session);
        jar.set_cookies.push(flag);
        jar.token = Some(token.to_string());
        Ok(())
    }

    /// Queue expiry of both cookies.
    pub fn clear(&self, jar: &mut SessionCookies) {
        for (name, http_only) in [(&self.session_name, true), (&self.flag_name, false)] {
            // Names were validated at construction, so this cannot fail.
            if let Ok(value) = HeaderValue::from_str(&self.format(name, "", 0, http_only)) {
                jar.set_cookies.push(value);
            }
        }
        jar.token = None;
    }

    fn format(&self, name: &str, value: &str, max_age_secs: i64, http_only: bool) -> String {
        let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={max_age_secs}");
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Per-request cookie state: the token the client sent plus any
/// `Set-Cookie` headers to emit.
///
/// Return it alongside a response body to apply the queued headers.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    token: Option<String>,
    set_cookies: Vec<HeaderValue>,
}

impl SessionCookies {
    /// The current session token: the one set during this request if any,
    /// otherwise the one the client presented.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_cookie_headers(&self) -> &[HeaderValue] {
        &self.set_cookies
    }
}

impl IntoResponseParts for SessionCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for value in self.set_cookies {
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}
