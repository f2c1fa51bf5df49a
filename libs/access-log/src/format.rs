//! Access log line formatting
//!
//! A format is a string of literal text and `:token` / `:token[argument]`
//! placeholders, compiled once into a [`FormatSpec`] and rendered per request
//! against a [`RequestInfo`] / [`ResponseInfo`] pair.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, OriginalUri},
    http::{HeaderMap, HeaderName, Method, Request, Response, StatusCode, Uri, Version, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};

use crate::error::{AccessLogError, AccessLogResult};

/// Apache combined log format
pub const COMBINED: &str = r#":remote-addr - :remote-user [:date[clf]] ":method :url HTTP/:http-version" :status :res[content-length] ":referrer" ":user-agent""#;

/// Apache common log format
pub const COMMON: &str =
    r#":remote-addr - :remote-user [:date[clf]] ":method :url HTTP/:http-version" :status :res[content-length]"#;

/// Compact line used outside production
pub const DEFAULT: &str = ":method :url :status :res[content-length] - :response-time ms";

pub const SHORT: &str = ":remote-addr :remote-user :method :url HTTP/:http-version :status :res[content-length] - :response-time ms";

pub const TINY: &str = ":method :url :status :res[content-length] - :response-time ms";

/// Placeholder rendered for tokens without a value
const MISSING: &str = "-";

/// What the logger knows about the inbound request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    /// The URI as the client sent it, before any router nesting
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub remote_addr: Option<IpAddr>,
}

impl RequestInfo {
    /// Capture request details before the request is handed on
    ///
    /// Only the headers `spec` reads are kept.
    pub fn from_request<B>(req: &Request<B>, spec: &FormatSpec) -> Self {
        let uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| req.uri().clone());

        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Self {
            method: req.method().clone(),
            uri,
            version: req.version(),
            headers: select_headers(req.headers(), &spec.request_headers),
            remote_addr,
        }
    }
}

/// What the logger knows once the response is ready
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Body length when the body knows it up front
    pub body_len: Option<u64>,
    /// Time between receiving the request and producing the response
    pub elapsed: Duration,
    /// Wall time at which the response completed
    pub finished_at: DateTime<Utc>,
}

impl ResponseInfo {
    pub fn from_response(
        res: &Response<Body>,
        spec: &FormatSpec,
        elapsed: Duration,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: res.status(),
            headers: select_headers(res.headers(), &spec.response_headers),
            body_len: res.body().size_hint().exact(),
            elapsed,
            finished_at,
        }
    }
}

/// Rendering of the `:date` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `10/Oct/2000:13:55:36 +0000`
    Clf,
    /// `2000-10-10T13:55:36.000Z`
    Iso,
    /// `Tue, 10 Oct 2000 13:55:36 GMT`
    Web,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Clf => "%d/%b/%Y:%H:%M:%S +0000",
            DateFormat::Iso => "%Y-%m-%dT%H:%M:%S%.3fZ",
            DateFormat::Web => "%a, %d %b %Y %H:%M:%S GMT",
        }
    }
}

/// A compiled placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Method,
    Url,
    Status,
    /// Elapsed milliseconds, optionally with a fixed number of decimals
    ResponseTime(Option<usize>),
    RemoteAddr,
    RemoteUser,
    Date(DateFormat),
    HttpVersion,
    Referrer,
    UserAgent,
    RequestHeader(HeaderName),
    ResponseHeader(HeaderName),
}

impl Token {
    fn compile(name: &str, arg: Option<&str>) -> AccessLogResult<Self> {
        let token = match name {
            "method" => Token::Method,
            "url" => Token::Url,
            "status" => Token::Status,
            "remote-addr" => Token::RemoteAddr,
            "remote-user" => Token::RemoteUser,
            "http-version" => Token::HttpVersion,
            "referrer" | "referer" => Token::Referrer,
            "user-agent" => Token::UserAgent,
            "response-time" => {
                let digits = arg
                    .map(|a| {
                        a.parse::<usize>()
                            .map_err(|_| AccessLogError::InvalidArgument {
                                token: name.to_string(),
                                arg: a.to_string(),
                            })
                    })
                    .transpose()?;
                Token::ResponseTime(digits)
            }
            "date" => match arg {
                None | Some("web") => Token::Date(DateFormat::Web),
                Some("clf") => Token::Date(DateFormat::Clf),
                Some("iso") => Token::Date(DateFormat::Iso),
                Some(other) => {
                    return Err(AccessLogError::InvalidArgument {
                        token: name.to_string(),
                        arg: other.to_string(),
                    });
                }
            },
            "req" | "res" => {
                let arg = arg.ok_or_else(|| AccessLogError::MissingArgument(name.to_string()))?;
                let header = HeaderName::from_bytes(arg.trim().to_ascii_lowercase().as_bytes())
                    .map_err(|_| AccessLogError::InvalidHeaderName(arg.to_string()))?;
                if name == "req" {
                    Token::RequestHeader(header)
                } else {
                    Token::ResponseHeader(header)
                }
            }
            _ => return Err(AccessLogError::UnknownToken(name.to_string())),
        };

        Ok(token)
    }

    /// Request headers this token reads
    fn request_headers(&self) -> Vec<HeaderName> {
        match self {
            Token::RemoteUser => vec![header::AUTHORIZATION],
            Token::Referrer => vec![header::REFERER, HeaderName::from_static("referrer")],
            Token::UserAgent => vec![header::USER_AGENT],
            Token::RequestHeader(name) => vec![name.clone()],
            _ => Vec::new(),
        }
    }

    fn render(&self, req: &RequestInfo, res: &ResponseInfo) -> Option<String> {
        match self {
            Token::Method => Some(req.method.as_str().to_string()),
            Token::Url => Some(
                req.uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.uri.to_string()),
            ),
            Token::Status => Some(res.status.as_u16().to_string()),
            Token::ResponseTime(digits) => Some(format_millis(res.elapsed, *digits)),
            Token::RemoteAddr => req.remote_addr.map(|ip| ip.to_string()),
            Token::RemoteUser => basic_auth_user(&req.headers),
            Token::Date(format) => Some(res.finished_at.format(format.pattern()).to_string()),
            Token::HttpVersion => Some(http_version(req.version).to_string()),
            Token::Referrer => header_value(&req.headers, &header::REFERER)
                .or_else(|| header_value(&req.headers, &HeaderName::from_static("referrer"))),
            Token::UserAgent => header_value(&req.headers, &header::USER_AGENT),
            Token::RequestHeader(name) => header_value(&req.headers, name),
            Token::ResponseHeader(name) => header_value(&res.headers, name).or_else(|| {
                (*name == header::CONTENT_LENGTH)
                    .then_some(res.body_len)
                    .flatten()
                    .map(|len| len.to_string())
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// A compiled log format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    source: String,
    segments: Vec<Segment>,
    request_headers: Vec<HeaderName>,
    response_headers: Vec<HeaderName>,
}

impl FormatSpec {
    /// Compile a format string
    ///
    /// Token names are two or more of `[A-Za-z0-9_-]`; a `:` that is not
    /// followed by such a name is kept as literal text. An argument is only
    /// taken from a non-empty `[...]` directly after the name; a `[` with no
    /// closing `]` is an error.
    pub fn parse(format: &str) -> AccessLogResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;

        while let Some(pos) = rest.find(':') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !is_name_char(c))
                .unwrap_or(after.len());

            if name_len < 2 {
                literal.push(':');
                rest = after;
                continue;
            }

            let name = &after[..name_len];
            let mut tail = &after[name_len..];
            let mut arg = None;
            if let Some(inner) = tail.strip_prefix('[') {
                match inner.find(']') {
                    None => return Err(AccessLogError::UnterminatedArgument(name.to_string())),
                    Some(0) => {}
                    Some(end) => {
                        arg = Some(&inner[..end]);
                        tail = &inner[end + 1..];
                    }
                }
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Token(Token::compile(name, arg)?));
            rest = tail;
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let mut request_headers = Vec::new();
        let mut response_headers = Vec::new();
        for segment in &segments {
            let Segment::Token(token) = segment else {
                continue;
            };
            let (wanted, names) = match token {
                Token::ResponseHeader(name) => (&mut response_headers, vec![name.clone()]),
                other => (&mut request_headers, other.request_headers()),
            };
            for name in names {
                if !wanted.contains(&name) {
                    wanted.push(name);
                }
            }
        }

        Ok(Self {
            source: format.to_string(),
            segments,
            request_headers,
            response_headers,
        })
    }

    /// Look up one of the predefined formats by name
    pub fn preset(name: &str) -> Option<Self> {
        let source = match name {
            "combined" => COMBINED,
            "common" => COMMON,
            "default" => DEFAULT,
            "short" => SHORT,
            "tiny" => TINY,
            _ => return None,
        };
        Some(Self::parse(source).expect("predefined log formats are valid"))
    }

    /// A preset name, or else a custom format string
    pub fn resolve(name_or_format: &str) -> AccessLogResult<Self> {
        match Self::preset(name_or_format.trim()) {
            Some(spec) => Ok(spec),
            None => Self::parse(name_or_format),
        }
    }

    pub fn combined() -> Self {
        Self::parse(COMBINED).expect("combined log format is valid")
    }

    pub fn compact() -> Self {
        Self::parse(DEFAULT).expect("default log format is valid")
    }

    /// The format string this spec was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Token(token) => Some(token),
            Segment::Literal(_) => None,
        })
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for FormatSpec {
    type Err = AccessLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

/// Render one access log line
pub fn format_line(request: &RequestInfo, response: &ResponseInfo, spec: &FormatSpec) -> String {
    let mut line = String::with_capacity(spec.source.len() + 64);
    for segment in &spec.segments {
        match segment {
            Segment::Literal(text) => line.push_str(text),
            Segment::Token(token) => match token.render(request, response) {
                Some(value) if !value.is_empty() => line.push_str(&value),
                _ => line.push_str(MISSING),
            },
        }
    }
    line
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Milliseconds as the shortest decimal that reads back to `nanos / 1e6`
fn format_millis(elapsed: Duration, digits: Option<usize>) -> String {
    let millis = elapsed.as_nanos() as f64 / 1_000_000.0;
    match digits {
        Some(digits) => format!("{:.*}", digits, millis),
        None => millis.to_string(),
    }
}

fn http_version(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "0.9"
    } else if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2.0"
    } else if version == Version::HTTP_3 {
        "3.0"
    } else {
        "1.1"
    }
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<String> = headers
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn select_headers(source: &HeaderMap, names: &[HeaderName]) -> HeaderMap {
    let mut selected = HeaderMap::new();
    for name in names {
        for value in source.get_all(name) {
            selected.append(name.clone(), value.clone());
        }
    }
    selected
}

fn basic_auth_user(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credentials) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(credentials.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, _password) = decoded.split_once(':')?;
    Some(user.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;
    use std::net::Ipv4Addr;

    fn request(method: Method, uri: &str) -> RequestInfo {
        RequestInfo {
            method,
            uri: uri.parse().unwrap(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            remote_addr: Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
        }
    }

    fn response(status: u16, content_length: Option<u64>, elapsed: Duration) -> ResponseInfo {
        let mut headers = HeaderMap::new();
        if let Some(len) = content_length {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        }
        ResponseInfo {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body_len: None,
            elapsed,
            finished_at: Utc.with_ymd_and_hms(2000, 10, 10, 13, 55, 36).unwrap(),
        }
    }

    #[test]
    fn test_compact_line_for_development() {
        let line = format_line(
            &request(Method::GET, "/users"),
            &response(200, Some(512), Duration::from_micros(12_300)),
            &FormatSpec::compact(),
        );
        assert_eq!(line, "GET /users 200 512 - 12.3 ms");
    }

    #[test]
    fn test_combined_line() {
        let mut req = request(Method::POST, "/auth/login?next=%2Fhome");
        req.headers
            .insert(header::USER_AGENT, HeaderValue::from_static("curl/8.4.0"));
        req.headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://app.example.com/"),
        );

        let line = format_line(
            &req,
            &response(201, Some(87), Duration::from_millis(3)),
            &FormatSpec::combined(),
        );
        assert_eq!(
            line,
            r#"127.0.0.1 - - [10/Oct/2000:13:55:36 +0000] "POST /auth/login?next=%2Fhome HTTP/1.1" 201 87 "https://app.example.com/" "curl/8.4.0""#
        );
    }

    #[test]
    fn test_missing_values_render_dash() {
        let mut req = request(Method::GET, "/stream");
        req.remote_addr = None;

        let line = format_line(
            &req,
            &response(200, None, Duration::from_millis(1)),
            &FormatSpec::combined(),
        );
        assert_eq!(
            line,
            r#"- - - [10/Oct/2000:13:55:36 +0000] "GET /stream HTTP/1.1" 200 - "-" "-""#
        );
    }

    #[test]
    fn test_content_length_falls_back_to_body_size() {
        let mut res = response(200, None, Duration::from_millis(2));
        res.body_len = Some(15);

        let line = format_line(&request(Method::GET, "/health"), &res, &FormatSpec::compact());
        assert_eq!(line, "GET /health 200 15 - 2 ms");
    }

    #[test]
    fn test_response_time_digits() {
        let spec = FormatSpec::parse(":response-time[3]|:response-time[0]|:response-time").unwrap();
        let line = format_line(
            &request(Method::GET, "/"),
            &response(200, None, Duration::from_nanos(1_234_567)),
            &spec,
        );
        assert_eq!(line, "1.235|1|1.234567");
    }

    #[test]
    fn test_remote_user_from_basic_auth() {
        let mut req = request(Method::GET, "/");
        // "alice:wonderland"
        req.headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic YWxpY2U6d29uZGVybGFuZA=="),
        );
        let spec = FormatSpec::parse(":remote-user").unwrap();
        let res = response(200, None, Duration::ZERO);
        assert_eq!(format_line(&req, &res, &spec), "alice");

        req.headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(format_line(&req, &res, &spec), "-");
    }

    #[test]
    fn test_date_formats() {
        let spec = FormatSpec::parse(":date[iso] | :date").unwrap();
        let line = format_line(
            &request(Method::GET, "/"),
            &response(200, None, Duration::ZERO),
            &spec,
        );
        assert_eq!(line, "2000-10-10T13:55:36.000Z | Tue, 10 Oct 2000 13:55:36 GMT");
    }

    #[test]
    fn test_header_tokens_join_repeated_values() {
        let mut req = request(Method::GET, "/");
        req.headers
            .append("x-request-id", HeaderValue::from_static("a1"));
        req.headers
            .append("x-request-id", HeaderValue::from_static("b2"));
        let spec = FormatSpec::parse(":req[X-Request-Id] :res[x-missing]").unwrap();

        let line = format_line(&req, &response(204, None, Duration::ZERO), &spec);
        assert_eq!(line, "a1, b2 -");
    }

    #[test]
    fn test_parse_keeps_stray_colons_and_brackets() {
        let spec = FormatSpec::parse("at: :status :x [] :method[]").unwrap();
        let line = format_line(
            &request(Method::DELETE, "/sessions/1"),
            &response(404, None, Duration::ZERO),
            &spec,
        );
        assert_eq!(line, "at: 404 :x [] DELETE[]");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            FormatSpec::parse(":method :bogus"),
            Err(AccessLogError::UnknownToken("bogus".to_string()))
        );
        assert_eq!(
            FormatSpec::parse(":res"),
            Err(AccessLogError::MissingArgument("res".to_string()))
        );
        assert!(matches!(
            FormatSpec::parse(":date[rfc]"),
            Err(AccessLogError::InvalidArgument { .. })
        ));
        assert!(matches!(
            FormatSpec::parse(":response-time[x]"),
            Err(AccessLogError::InvalidArgument { .. })
        ));
        assert!(matches!(
            FormatSpec::parse(":req[bad header]"),
            Err(AccessLogError::InvalidHeaderName(_))
        ));
    }

    #[test]
    fn test_unterminated_argument_is_rejected() {
        for (format, token) in [
            ("[:date[clf", "date"),
            (":method :response-time[3 ms", "response-time"),
            (":res[content-length", "res"),
        ] {
            assert_eq!(
                FormatSpec::parse(format),
                Err(AccessLogError::UnterminatedArgument(token.to_string())),
                "format {format:?}"
            );
        }
    }

    #[test]
    fn test_capture_keeps_only_referenced_headers() {
        let req = Request::builder()
            .uri("/users")
            .header(header::USER_AGENT, "curl/8.4.0")
            .header(header::COOKIE, "session=secret")
            .header("x-request-id", "abc")
            .body(())
            .unwrap();

        let compact = RequestInfo::from_request(&req, &FormatSpec::compact());
        assert!(compact.headers.is_empty());

        let combined = RequestInfo::from_request(&req, &FormatSpec::combined());
        assert_eq!(combined.headers.len(), 1);
        assert_eq!(combined.headers[header::USER_AGENT], "curl/8.4.0");

        let custom = FormatSpec::parse(":req[x-request-id] :res[x-trace]").unwrap();
        let captured = RequestInfo::from_request(&req, &custom);
        assert_eq!(captured.headers.len(), 1);
        assert_eq!(captured.headers["x-request-id"], "abc");

        let res = Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-trace", "t-1")
            .body(Body::from("{}"))
            .unwrap();
        let finished = ResponseInfo::from_response(&res, &custom, Duration::ZERO, Utc::now());
        assert_eq!(finished.headers.len(), 1);
        assert_eq!(finished.headers["x-trace"], "t-1");
        assert_eq!(finished.body_len, Some(2));
    }

    #[test]
    fn test_resolve_presets_and_custom() {
        for name in ["combined", "common", "default", "short", "tiny"] {
            assert!(FormatSpec::preset(name).is_some(), "missing preset {name}");
        }
        assert_eq!(FormatSpec::resolve("tiny").unwrap().as_str(), TINY);
        assert_eq!(FormatSpec::resolve(" combined ").unwrap(), FormatSpec::combined());

        let custom: FormatSpec = ":method :status".parse().unwrap();
        assert_eq!(custom.to_string(), ":method :status");
        assert_eq!(
            custom.tokens().cloned().collect::<Vec<_>>(),
            vec![Token::Method, Token::Status]
        );
    }

    #[test]
    fn test_http_version_names() {
        let spec = FormatSpec::parse(":http-version").unwrap();
        let mut req = request(Method::GET, "/");
        let res = response(200, None, Duration::ZERO);

        req.version = Version::HTTP_2;
        assert_eq!(format_line(&req, &res, &spec), "2.0");
        req.version = Version::HTTP_10;
        assert_eq!(format_line(&req, &res, &spec), "1.0");
    }
}
