//! Status line and standard reason phrases.

use http::Version;

use crate::protocol::ParseError;

/// A parsed `HTTP/<major>.<minor> <code> <reason>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// The raw version token, e.g. `HTTP/1.1`.
    pub version: String,
    pub status: u16,
    /// The reason phrase as sent, surrounding whitespace removed.
    pub reason: String,
}

impl StatusLine {
    /// Maps the version token onto the two protocol families the client speaks.
    ///
    /// `HTTP/1.0` and the legacy `HTTP/0.9` are treated as HTTP/1.0, any other
    /// `HTTP/1.x` as HTTP/1.1.
    pub fn http_version(&self) -> Result<Version, ParseError> {
        match self.version.as_str() {
            "HTTP/1.0" | "HTTP/0.9" => Ok(Version::HTTP_10),
            v if v.starts_with("HTTP/1.") => Ok(Version::HTTP_11),
            v => Err(ParseError::unknown_protocol(v)),
        }
    }
}

/// Returns the standard reason phrase for a status code.
///
/// Only used as default text when the server sends an empty reason.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let reason = match code {
        100 => "Continue",
        101 => "Switching Protocols",

        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",

        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 => "(Unused)",
        307 => "Temporary Redirect",

        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",

        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        511 => "Network Authentication Required",

        other => return http::StatusCode::from_u16(other).ok().and_then(|s| s.canonical_reason()),
    };
    Some(reason)
}
