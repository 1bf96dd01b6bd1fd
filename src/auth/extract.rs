use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use std::net::SocketAddr;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Places a request may carry a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `Authorization: Bearer <token>`
    BearerHeader,
    /// `Cookie: token=<token>`
    Cookie,
}

/// Sources are tried in this order; the first non-empty value wins.
pub const EXTRACTION_ORDER: [CredentialSource; 2] = [CredentialSource::BearerHeader, CredentialSource::Cookie];

impl CredentialSource {
    pub fn extract(&self, req: &HttpRequest) -> Option<String> {
        let token = match self {
            CredentialSource::BearerHeader => req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string()),
            CredentialSource::Cookie => req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()),
        };
        token.filter(|t| !t.is_empty())
    }
}

/// Returns the first credential found, with where it came from.
pub fn extract_credential(req: &HttpRequest) -> Option<(CredentialSource, String)> {
    EXTRACTION_ORDER
        .iter()
        .find_map(|source| source.extract(req).map(|token| (*source, token)))
}

/// Caller identity used for rate limiting: first forwarded hop, else the
/// peer IP. Ports are dropped so reconnects share one identity.
pub fn client_identifier(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .map(|addr| match addr.parse::<SocketAddr>() {
            Ok(socket) => socket.ip().to_string(),
            Err(_) => addr.to_string(),
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_header() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req),
            Some((CredentialSource::BearerHeader, "abc.def.ghi".to_string()))
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let req = TestRequest::default()
            .insert_header(("Cookie", "theme=dark; token=from-cookie"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req),
            Some((CredentialSource::Cookie, "from-cookie".to_string()))
        );
    }

    #[test]
    fn test_bearer_takes_precedence_over_cookie() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer from-header"))
            .insert_header(("Cookie", "token=from-cookie"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req).map(|(source, _)| source),
            Some(CredentialSource::BearerHeader)
        );
    }

    #[test]
    fn test_non_bearer_scheme_falls_back_to_cookie() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .insert_header(("Cookie", "token=from-cookie"))
            .to_http_request();

        assert_eq!(
            extract_credential(&req),
            Some((CredentialSource::Cookie, "from-cookie".to_string()))
        );
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .insert_header(("Cookie", "token="))
            .to_http_request();

        assert_eq!(extract_credential(&req), None);
        assert_eq!(extract_credential(&TestRequest::default().to_http_request()), None);
    }

    #[test]
    fn test_client_identifier_uses_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .to_http_request();
        assert_eq!(client_identifier(&req), "203.0.113.7");

        let req = TestRequest::default()
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_identifier(&req), "192.0.2.1");

        assert_eq!(client_identifier(&TestRequest::default().to_http_request()), "unknown");
    }
}
