//! Responses the gateway produces without contacting the upstream.

use bytes::Bytes;
use csrf_token::{CookieDirective, CsrfError, SecretToken, Verdict, generate_secret, hash};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;

use crate::guard::{Admission, Guard};

/// A locally generated JSON response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Bytes,
    pub set_cookie: Option<CookieDirective>,
}

impl Reply {
    fn json(status: StatusCode, value: serde_json::Value) -> Self {
        Self {
            status,
            body: Bytes::from(value.to_string()),
            set_cookie: None,
        }
    }

    fn internal_error() -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "message": "Internal server error" }),
        )
    }
}

#[derive(Serialize)]
struct IssueBody<'a> {
    token: &'a str,
    #[serde(rename = "headerName")]
    header_name: &'a str,
}

/// A freshly minted token and the cookie binding its digest.
pub struct Issued {
    pub token: SecretToken,
    pub cookie: CookieDirective,
}

/// Mint a new token pair. Nothing is written unless every step succeeds.
pub fn issue(guard: &Guard) -> Result<Issued, CsrfError> {
    let token = generate_secret()?;
    let cookie = guard.store().issue(&hash(&token));
    if cookie.to_header().is_none() {
        return Err(CsrfError::Issuance(
            "binding cookie is not a valid header value".into(),
        ));
    }

    Ok(Issued { token, cookie })
}

/// `GET <issue_path>`: `200 {token, headerName}` with the binding cookie, or a bare `500`.
pub fn issue_reply(guard: &Guard) -> Reply {
    let issued = match issue(guard) {
        Ok(issued) => issued,
        Err(e) => {
            log::error!("failed to issue csrf token: {e}");
            return Reply::internal_error();
        }
    };

    let body = IssueBody {
        token: issued.token.as_str(),
        header_name: guard.header_name().as_str(),
    };
    match serde_json::to_vec(&body) {
        Ok(body) => Reply {
            status: StatusCode::OK,
            body: Bytes::from(body),
            set_cookie: Some(issued.cookie),
        },
        Err(e) => {
            log::error!("failed to encode csrf token response: {e}");
            Reply::internal_error()
        }
    }
}

/// Diagnostic check of the submitted header against the cookie.
pub fn validate_reply(guard: &Guard, headers: &http::HeaderMap) -> Reply {
    match guard.verify(headers) {
        Verdict::Valid => Reply::json(StatusCode::OK, json!({ "valid": true })),
        Verdict::MissingToken => Reply::json(
            StatusCode::BAD_REQUEST,
            json!({ "valid": false, "error": CsrfError::MissingToken.to_string() }),
        ),
        Verdict::InvalidToken => Reply::json(
            StatusCode::FORBIDDEN,
            json!({ "valid": false, "error": CsrfError::InvalidToken.to_string() }),
        ),
    }
}

/// `403` for a protected request that failed the guard.
pub fn rejection_reply(admission: Admission) -> Option<Reply> {
    let error = match admission {
        Admission::Exempt | Admission::Verified => return None,
        Admission::MissingToken => CsrfError::MissingToken,
        Admission::InvalidToken => CsrfError::InvalidToken,
    };

    Some(Reply::json(
        StatusCode::FORBIDDEN,
        json!({ "message": error.to_string() }),
    ))
}

/// Any method other than GET on the issuance path.
pub fn method_not_allowed() -> Reply {
    Reply::json(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({ "message": "Method not allowed" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::GatewayConfig;
    use http::{HeaderMap, HeaderValue, header};

    fn guard() -> Guard {
        let config = GatewayConfig::from_yaml("upstream:\n  address: \"127.0.0.1:9001\"\n").unwrap();
        Guard::new(&config).unwrap()
    }

    fn body(reply: &Reply) -> serde_json::Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    fn replay(reply: &Reply, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &reply.set_cookie {
            let pair = cookie.cookie().stripped().to_string();
            headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        }
        if let Some(token) = token {
            headers.insert("x-csrf-token", HeaderValue::from_str(token).unwrap());
        }
        headers
    }

    #[test]
    fn issue_reply_returns_token_and_cookie() {
        let guard = guard();
        let reply = issue_reply(&guard);
        let body = body(&reply);

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(body["headerName"], "x-csrf-token");
        let token = body["token"].as_str().unwrap();
        assert_eq!(token.len(), 64);

        let cookie = reply.set_cookie.as_ref().unwrap().header_value();
        assert!(cookie.contains("HttpOnly"));
        // The digest goes in the cookie, never the token itself.
        assert!(!cookie.contains(token));
        assert!(cookie.contains(hash(token).as_str()));
    }

    #[test]
    fn issue_never_reuses_a_token() {
        let guard = guard();
        let first = body(&issue_reply(&guard));
        let second = body(&issue_reply(&guard));
        assert_ne!(first["token"], second["token"]);
    }

    #[test]
    fn issuance_failure_sets_no_cookie() {
        let mut config =
            GatewayConfig::from_yaml("upstream:\n  address: \"127.0.0.1:9001\"\n").unwrap();
        // Renders a Set-Cookie that is not a valid header value.
        config.csrf.cookie_name = "bad\nname".to_string();
        let guard = Guard::new(&config).unwrap();

        assert!(matches!(issue(&guard), Err(CsrfError::Issuance(_))));

        let reply = issue_reply(&guard);
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(reply.set_cookie.is_none());
        let body = body(&reply);
        assert_eq!(body, json!({ "message": "Internal server error" }));
        assert!(body.get("token").is_none());
    }

    #[test]
    fn validate_reply_statuses() {
        let guard = guard();
        let issued = issue_reply(&guard);
        let token = body(&issued)["token"].as_str().unwrap().to_string();

        let ok = validate_reply(&guard, &replay(&issued, Some(&token)));
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(body(&ok), json!({ "valid": true }));

        let missing = validate_reply(&guard, &replay(&issued, None));
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(body(&missing), json!({ "valid": false, "error": "Missing token" }));

        let invalid = validate_reply(&guard, &replay(&issued, Some("deadbeef")));
        assert_eq!(invalid.status, StatusCode::FORBIDDEN);
        assert_eq!(body(&invalid), json!({ "valid": false, "error": "Invalid token" }));
    }

    #[test]
    fn rejection_reply_bodies() {
        assert!(rejection_reply(Admission::Verified).is_none());
        assert!(rejection_reply(Admission::Exempt).is_none());

        let missing = rejection_reply(Admission::MissingToken).unwrap();
        assert_eq!(missing.status, StatusCode::FORBIDDEN);
        assert_eq!(body(&missing), json!({ "message": "Missing token" }));

        let invalid = rejection_reply(Admission::InvalidToken).unwrap();
        assert_eq!(body(&invalid), json!({ "message": "Invalid token" }));
    }
}
