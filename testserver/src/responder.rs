//! Request handling. Contains [respond], building a response for every request
//! reaching the server.

use bytes::Bytes;
use futures::stream;
use http::{HeaderMap, HeaderValue, Method, Response, StatusCode, Uri, header};
use http_body_util::{BodyExt, Empty, StreamBody, combinators::UnsyncBoxBody};
use hyper::body::Frame;
use std::{convert::Infallible, time::Duration};

/// Response body type produced by [respond].
pub type Body = UnsyncBoxBody<Bytes, Infallible>;

/// Parameters of `GET /file` request.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FileParameters {
    /// Total number of bytes in the body.
    pub num_bytes: u64,
    /// Pause before each block is sent.
    pub delay: Duration,
    /// Size of single block.
    pub block_size: u64,
}
impl Default for FileParameters {
    fn default() -> Self {
        Self {
            num_bytes: 100,
            delay: Duration::ZERO,
            block_size: 100,
        }
    }
}
impl FileParameters {
    /// Parses `numBytes`, `delay` (fractional seconds) and `blockSize` from url
    /// query. Missing parameters keep their defaults, unknown are ignored.
    pub fn from_query(query: &str) -> Result<Self, String> {
        let mut parameters = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "numBytes" => {
                    parameters.num_bytes = value
                        .parse()
                        .map_err(|_| format!("invalid numBytes {value:?}"))?;
                }
                "delay" => {
                    parameters.delay = value
                        .parse::<f64>()
                        .ok()
                        .and_then(|delay| Duration::try_from_secs_f64(delay).ok())
                        .ok_or_else(|| format!("invalid delay {value:?}"))?;
                }
                "blockSize" => {
                    parameters.block_size = value
                        .parse()
                        .ok()
                        .filter(|block_size| *block_size > 0)
                        .ok_or_else(|| format!("invalid blockSize {value:?}"))?;
                }
                _ => {}
            }
        }

        Ok(parameters)
    }
}

/// Builds response for given request parts.
///
/// - `HEAD` on any path returns `200`.
/// - `GET` with `If-Modified-Since` returns `304`.
/// - `GET /file` returns [FileParameters::num_bytes] bytes of `a`, sent in
///   blocks, each delayed by [FileParameters::delay].
/// - Everything else returns `404` (or `405` for other methods).
pub fn respond(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Response<Body> {
    match method {
        &Method::HEAD => response_empty(StatusCode::OK, true),
        &Method::GET if headers.contains_key(header::IF_MODIFIED_SINCE) => {
            response_empty(StatusCode::NOT_MODIFIED, false)
        }
        &Method::GET if uri.path() == "/file" => {
            match FileParameters::from_query(uri.query().unwrap_or("")) {
                Ok(parameters) => response_file(parameters),
                Err(message) => {
                    log::warn!("{uri}: {message}");
                    response_empty(StatusCode::BAD_REQUEST, false)
                }
            }
        }
        &Method::GET => response_empty(StatusCode::NOT_FOUND, false),
        _ => response_empty(StatusCode::METHOD_NOT_ALLOWED, false),
    }
}

fn response_empty(
    status: StatusCode,
    html: bool,
) -> Response<Body> {
    let mut response = Response::new(Empty::new().boxed_unsync());
    *response.status_mut() = status;
    if html {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    }
    response
}

fn response_file(parameters: FileParameters) -> Response<Body> {
    let FileParameters {
        num_bytes,
        delay,
        block_size,
    } = parameters;

    let blocks = stream::unfold(0u64, move |sent| async move {
        if sent >= num_bytes {
            return None;
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let block_length = block_size.min(num_bytes - sent);
        let block = Bytes::from(vec![b'a'; block_length as usize]);
        let sent = sent + block_length;
        log::trace!("sent {sent} of {num_bytes} bytes");

        Some((Ok::<_, Infallible>(Frame::data(block)), sent))
    });

    let mut response = Response::new(StreamBody::new(blocks).boxed_unsync());
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(num_bytes));
    response
}
