//! HTTP/1 block page to HTTP/2 HEADERS + DATA frame translation

use bytes::Bytes;
use http::{HeaderName, StatusCode};

use crate::frame::{
    DEFAULT_MAX_FRAME_SIZE,
    FLAG_END_HEADERS,
    FLAG_END_STREAM,
    FRAME_HEADER_SIZE,
    FRAME_TYPE_DATA,
    FRAME_TYPE_HEADERS,
    write_frame_header,
};
use crate::state::StreamId;

/// Maximum number of header lines accepted in a block page
const MAX_PAGE_HEADERS: usize = 32;

/// Connection-specific fields that must not appear in HTTP/2 (RFC 7540
/// §8.1.2.2)
const CONNECTION_SPECIFIC: [&str; 5] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
];

/// Why a block page could not be translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationError {
    /// The page is not a complete, well-formed HTTP/1 response
    PageTranslation,
    /// The encoded header block exceeds the configured maximum
    TranslatedHdrsSize,
    /// The body does not fit the configured maximum
    Http2BodySize,
}

impl std::fmt::Display for TranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageTranslation => write!(f, "block page is not a valid HTTP/1 response"),
            Self::TranslatedHdrsSize => write!(f, "translated header block too large"),
            Self::Http2BodySize => write!(f, "block page body too large"),
        }
    }
}

impl std::error::Error for TranslationError {}

/// Size limits for translated pages
#[derive(Debug, Clone)]
pub struct TranslationLimits {
    /// Maximum HPACK-encoded header block size in bytes (default: 2000)
    pub max_header_block_size: usize,
    /// Maximum body size in bytes; the body is sent as a single DATA frame
    /// (default: 16384, the default SETTINGS_MAX_FRAME_SIZE)
    pub max_body_size:         usize,
}

impl Default for TranslationLimits {
    fn default() -> Self {
        Self {
            max_header_block_size: 2000,
            max_body_size:         DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Converts an HTTP/1-style block page into HTTP/2 frames for one stream.
pub trait PageTranslator {
    fn translate(&self, page: &[u8], stream_id: StreamId) -> Result<Bytes, TranslationError>;
}

/// [`PageTranslator`] that parses the page as an HTTP/1 response and emits
/// one HEADERS frame followed, if there is a body, by one DATA frame.
#[derive(Debug, Clone, Default)]
pub struct Http1PageTranslator {
    limits: TranslationLimits,
}

impl Http1PageTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: TranslationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &TranslationLimits {
        &self.limits
    }
}

impl PageTranslator for Http1PageTranslator {
    fn translate(&self, page: &[u8], stream_id: StreamId) -> Result<Bytes, TranslationError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_PAGE_HEADERS];
        let mut res = httparse::Response::new(&mut headers);

        let body_offset = match res.parse(page) {
            Ok(httparse::Status::Complete(len)) => len,
            _ => return Err(TranslationError::PageTranslation),
        };
        let status = res
            .code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or(TranslationError::PageTranslation)?;

        let mut fields: Vec<(HeaderName, &[u8])> = Vec::with_capacity(res.headers.len());
        for h in res.headers.iter() {
            let name = HeaderName::from_bytes(h.name.as_bytes())
                .map_err(|_| TranslationError::PageTranslation)?;
            if CONNECTION_SPECIFIC.contains(&name.as_str()) {
                continue;
            }
            fields.push((name, h.value));
        }

        let header_block = {
            let mut encoder = loona_hpack::Encoder::new();
            let pseudo = std::iter::once((&b":status"[..], status.as_str().as_bytes()));
            let regular = fields.iter().map(|(name, value)| (name.as_str().as_bytes(), *value));
            encoder.encode(pseudo.chain(regular))
        };
        if header_block.len() > self.limits.max_header_block_size {
            crate::trace_warn!(
                size = header_block.len(),
                max = self.limits.max_header_block_size,
                "translated header block too large"
            );
            return Err(TranslationError::TranslatedHdrsSize);
        }

        let body = &page[body_offset..];
        if body.len() > self.limits.max_body_size {
            return Err(TranslationError::Http2BodySize);
        }

        let data_frame_len = if body.is_empty() { 0 } else { FRAME_HEADER_SIZE + body.len() };
        let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + header_block.len() + data_frame_len);

        let headers_flags = if body.is_empty() {
            FLAG_END_HEADERS | FLAG_END_STREAM
        } else {
            FLAG_END_HEADERS
        };
        write_frame_header(
            &mut out,
            header_block.len(),
            FRAME_TYPE_HEADERS,
            headers_flags,
            stream_id,
        );
        out.extend_from_slice(&header_block);

        if !body.is_empty() {
            write_frame_header(&mut out, body.len(), FRAME_TYPE_DATA, FLAG_END_STREAM, stream_id);
            out.extend_from_slice(body);
        }

        Ok(Bytes::from(out))
    }
}
