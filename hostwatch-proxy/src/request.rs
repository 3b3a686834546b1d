//! Request target parsing and canned proxy responses

use crate::error::{ProxyError, Result};
use http_body_util::{BodyExt, Empty, Full, combinators::BoxBody};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode, Uri};

pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Where a proxied request is going
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// CONNECT tunnel to `authority` (`host:port`)
    Tunnel { authority: String },
    /// Plain HTTP request
    Forward {
        /// Host key as it appears on the wire
        host: String,
        /// Address to dial upstream
        addr: String,
        path: String,
    },
}

impl Target {
    /// Extract the destination of a proxied request
    ///
    /// The host key is the request authority taken verbatim: the CONNECT
    /// target or the absolute-form URI authority.
    pub fn from_request<B>(req: &Request<B>) -> Result<Self> {
        let uri = req.uri();

        if *req.method() == Method::CONNECT {
            let authority = uri
                .authority()
                .filter(|a| a.port_u16().is_some())
                .ok_or_else(|| ProxyError::InvalidTarget(format!("CONNECT {}", uri)))?;
            return Ok(Target::Tunnel {
                authority: authority.as_str().to_string(),
            });
        }

        // Only absolute-form requests are proxied. Origin-form requests are
        // addressed to this server itself, and following their Host header
        // can loop back to the listener.
        let authority = uri
            .authority()
            .ok_or_else(|| ProxyError::NotProxyRequest(uri.to_string()))?;
        if uri.scheme_str() != Some("http") {
            return Err(ProxyError::InvalidTarget(format!(
                "unsupported scheme in {}",
                uri
            )));
        }
        let host = authority.as_str().to_string();

        Ok(Target::Forward {
            addr: upstream_addr(&host)?,
            host,
            path: uri.path().to_string(),
        })
    }
}

/// `host:port` to dial for an authority, defaulting to port 80
fn upstream_addr(authority: &str) -> Result<String> {
    let parsed: http::uri::Authority = authority
        .parse()
        .map_err(|_| ProxyError::InvalidTarget(authority.to_string()))?;

    Ok(format!("{}:{}", parsed.host(), parsed.port_u16().unwrap_or(80)))
}

/// Rewrite an absolute-form request to origin-form for the upstream server
pub fn to_origin_form<B>(req: &mut Request<B>) -> Result<()> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let origin: Uri = path_and_query
        .parse()
        .map_err(|_| ProxyError::InvalidTarget(path_and_query.to_string()))?;

    *req.uri_mut() = origin;
    req.headers_mut().remove("proxy-connection");
    Ok(())
}

pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn full<T: Into<Bytes>>(chunk: T) -> ProxyBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Plain-text error response
pub fn error_response(status: StatusCode, message: &str) -> Response<ProxyBody> {
    let mut resp = Response::new(full(message.to_string()));
    *resp.status_mut() = status;
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header;

    fn request(method: Method, uri: &str, host: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(h) = host {
            builder = builder.header(header::HOST, h);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_connect_target() {
        let req = request(Method::CONNECT, "api.github.com:443", None);
        assert_eq!(
            Target::from_request(&req).unwrap(),
            Target::Tunnel {
                authority: "api.github.com:443".to_string()
            }
        );
    }

    #[test]
    fn test_connect_without_port() {
        let req = request(Method::CONNECT, "api.github.com", None);
        assert!(Target::from_request(&req).is_err());
    }

    #[test]
    fn test_absolute_form_target() {
        let req = request(Method::GET, "http://example.com/a/b?x=1", Some("ignored.com"));
        assert_eq!(
            Target::from_request(&req).unwrap(),
            Target::Forward {
                host: "example.com".to_string(),
                addr: "example.com:80".to_string(),
                path: "/a/b".to_string(),
            }
        );
    }

    #[test]
    fn test_absolute_form_with_port() {
        let req = request(Method::POST, "http://192.168.1.10:8080/api/v1/users", None);
        match Target::from_request(&req).unwrap() {
            Target::Forward { host, addr, path } => {
                assert_eq!(host, "192.168.1.10:8080");
                assert_eq!(addr, "192.168.1.10:8080");
                assert_eq!(path, "/api/v1/users");
            }
            other => panic!("Expected Forward target, got {:?}", other),
        }
    }

    #[test]
    fn test_host_not_normalized() {
        let req = request(Method::GET, "http://Example.COM/", None);
        match Target::from_request(&req).unwrap() {
            Target::Forward { host, .. } => assert_eq!(host, "Example.COM"),
            other => panic!("Expected Forward target, got {:?}", other),
        }
    }

    #[test]
    fn test_origin_form_rejected() {
        let req = request(Method::GET, "/status/200", Some("httpbin.org:443"));
        assert!(matches!(
            Target::from_request(&req),
            Err(ProxyError::NotProxyRequest(_))
        ));
    }

    #[test]
    fn test_origin_form_without_host() {
        let req = request(Method::GET, "/status/200", None);
        assert!(matches!(
            Target::from_request(&req),
            Err(ProxyError::NotProxyRequest(_))
        ));
    }

    #[test]
    fn test_https_absolute_form_rejected() {
        let req = request(Method::GET, "https://example.com/secure", None);
        assert!(matches!(
            Target::from_request(&req),
            Err(ProxyError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_to_origin_form() {
        let mut req = Request::builder()
            .uri("http://example.com/a?b=c")
            .header("proxy-connection", "keep-alive")
            .body(())
            .unwrap();

        to_origin_form(&mut req).unwrap();
        assert_eq!(req.uri().to_string(), "/a?b=c");
        assert!(req.headers().get("proxy-connection").is_none());
    }

    #[test]
    fn test_to_origin_form_empty_path() {
        let mut req = request(Method::GET, "http://example.com", None);
        to_origin_form(&mut req).unwrap();
        assert_eq!(req.uri().to_string(), "/");
    }
}
