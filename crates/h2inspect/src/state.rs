use std::collections::VecDeque;

use crate::infraction::InfractionLog;
use crate::request_line::RequestLineOutcome;

/// Newtype for HTTP/2 stream identifiers (RFC 7540 §5.1.1: 31-bit unsigned
/// integer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Stream 0 carries connection control frames only
    pub fn is_connection(self) -> bool {
        self.0 == 0
    }

    /// Odd stream ids are opened by the client
    pub fn is_client_initiated(self) -> bool {
        self.0 % 2 == 1
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<StreamId> for u32 {
    fn from(v: StreamId) -> Self {
        v.0
    }
}

/// Which endpoint sent the bytes of a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// Client to server (requests)
    Client,
    /// Server to client (responses)
    Server,
}

/// Configurable limits for HTTP/2 header decoding.
///
/// These limits defend against resource exhaustion from untrusted input
/// (e.g., HPACK decompression bombs, oversized frames).
#[derive(Debug, Clone)]
pub struct H2Limits {
    /// Maximum total decoded header list size in bytes (default: 65536, RFC
    /// 7540 default)
    pub max_header_list_size:  usize,
    /// Maximum number of headers per header block (default: 128)
    pub max_header_count:      usize,
    /// Maximum size of any individual header value in bytes (default: 8192)
    pub max_header_value_size: usize,
    /// Hard cap for HPACK dynamic table size (default: 65536)
    pub max_table_size:        usize,
    /// Maximum buffered bytes per direction, covering a partially received
    /// frame and an unfinished HEADERS/CONTINUATION sequence (default: 1 MiB)
    pub max_buffer_size:       usize,
}

impl Default for H2Limits {
    fn default() -> Self {
        Self {
            max_header_list_size:  65536,
            max_header_count:      128,
            max_header_value_size: 8192,
            max_table_size:        65536,
            max_buffer_size:       1024 * 1024, // 1 MiB
        }
    }
}

/// Header block being reassembled from HEADERS + CONTINUATION frames
pub(crate) struct PendingHeaderBlock {
    pub(crate) stream_id: StreamId,
    pub(crate) fragment:  Vec<u8>,
    /// First header block on a new stream (as opposed to trailers)
    pub(crate) initial:   bool,
}

/// Frame-level state for one direction of an HTTP/2 connection.
///
/// Feed raw bytes with [`feed`](Self::feed). The direction reports whether it
/// is in the middle of a frame ([`reading_frame`](Self::reading_frame)) or of
/// a HEADERS/CONTINUATION sequence
/// ([`continuation_expected`](Self::continuation_expected)). On the client
/// direction, each new request stream yields a request-line outcome that can
/// be retrieved with [`try_pop`](Self::try_pop).
pub struct H2DirectionState {
    pub(crate) source: SourceId,

    /// Persistent HPACK decoder with dynamic table
    pub(crate) decoder: loona_hpack::Decoder<'static>,

    /// Resource limits for header decoding and buffering
    pub(crate) limits: H2Limits,

    /// Whether the client connection preface has been consumed
    pub preface_received: bool,

    /// Highest stream id that opened with a header block; header blocks on
    /// lower or equal ids are trailers
    pub(crate) highest_stream_id: StreamId,

    /// Bytes of a frame that has not been fully received yet
    pub(crate) buffer: Vec<u8>,

    /// HEADERS frame seen without END_HEADERS; cleared when the CONTINUATION
    /// carrying END_HEADERS arrives
    pub(crate) pending_headers: Option<PendingHeaderBlock>,

    /// Request-line outcomes ready to be popped, in stream-open order
    pub(crate) completed: VecDeque<(StreamId, RequestLineOutcome)>,

    /// Infractions and detection events raised on this direction
    pub(crate) infractions: InfractionLog,

    /// Fatal error that stopped parsing; later feeds return it unparsed
    pub(crate) failed: Option<ParseError>,
}

impl H2DirectionState {
    /// Create a direction with default limits.
    pub fn new(source: SourceId) -> Self {
        Self::with_limits(source, H2Limits::default())
    }

    /// Create a direction with custom limits.
    pub fn with_limits(source: SourceId, limits: H2Limits) -> Self {
        let mut decoder = loona_hpack::Decoder::new();
        decoder.set_max_allowed_table_size(limits.max_table_size);
        Self {
            source,
            decoder,
            limits,
            // Only the client sends the preface
            preface_received: source == SourceId::Server,
            highest_stream_id: StreamId(0),
            buffer: Vec::new(),
            pending_headers: None,
            completed: VecDeque::new(),
            infractions: InfractionLog::new(),
            failed: None,
        }
    }

    /// Feed the next bytes of this direction.
    ///
    /// Returns Ok(()) when the data was consumed, even if it ends mid-frame.
    /// Returns Err only for errors that make the direction unusable (HPACK
    /// corruption, oversize input, broken CONTINUATION sequence). The error
    /// is latched: every later feed returns it without parsing.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), ParseError> {
        if let Some(e) = &self.failed {
            return Err(e.clone());
        }
        if self.buffer.len() + data.len() > self.limits.max_buffer_size {
            crate::trace_warn!(
                source = ?self.source,
                buffered = self.buffer.len(),
                incoming = data.len(),
                "HTTP/2 buffer limit exceeded"
            );
            return Err(self.fail(ParseError::new(ParseErrorKind::Http2BufferTooLarge)));
        }
        self.buffer.extend_from_slice(data);
        crate::parse::parse_buffer_incremental(self).map_err(|e| self.fail(e))
    }

    fn fail(&mut self, e: ParseError) -> ParseError {
        self.failed = Some(e.clone());
        e
    }

    /// True while only part of a frame (header or payload) has been received.
    pub fn reading_frame(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// True between a HEADERS frame without END_HEADERS and the CONTINUATION
    /// frame that ends the header block.
    pub fn continuation_expected(&self) -> bool {
        self.pending_headers.is_some()
    }

    /// The error that stopped this direction, if any.
    pub fn failure(&self) -> Option<&ParseError> {
        self.failed.as_ref()
    }

    /// True when nothing may be written into this direction at a frame
    /// boundary: a frame or header block is in progress, or parsing failed
    /// and the boundaries are no longer known.
    pub fn mid_frame(&self) -> bool {
        self.reading_frame() || self.continuation_expected() || self.failed.is_some()
    }

    /// Pop the request-line outcome of the next newly opened stream.
    pub fn try_pop(&mut self) -> Option<(StreamId, RequestLineOutcome)> {
        self.completed.pop_front()
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn infractions(&self) -> &InfractionLog {
        &self.infractions
    }
}

/// Per-flow HTTP/2 session data: one [`H2DirectionState`] per direction.
///
/// This is the only writer of the `reading_frame` / `continuation_expected`
/// flags, combined by [`mid_frame`](Self::mid_frame) for the payload injector.
pub struct H2FlowData {
    client: H2DirectionState,
    server: H2DirectionState,
}

impl Default for H2FlowData {
    fn default() -> Self {
        Self::new()
    }
}

impl H2FlowData {
    pub fn new() -> Self {
        Self::with_limits(H2Limits::default())
    }

    pub fn with_limits(limits: H2Limits) -> Self {
        Self {
            client: H2DirectionState::with_limits(SourceId::Client, limits.clone()),
            server: H2DirectionState::with_limits(SourceId::Server, limits),
        }
    }

    /// Feed bytes sent by `source`.
    pub fn feed(&mut self, source: SourceId, data: &[u8]) -> Result<(), ParseError> {
        self.direction_mut(source).feed(data)
    }

    pub fn reading_frame(&self, source: SourceId) -> bool {
        self.direction(source).reading_frame()
    }

    pub fn continuation_expected(&self, source: SourceId) -> bool {
        self.direction(source).continuation_expected()
    }

    pub fn mid_frame(&self, source: SourceId) -> bool {
        self.direction(source).mid_frame()
    }

    pub fn direction(&self, source: SourceId) -> &H2DirectionState {
        match source {
            SourceId::Client => &self.client,
            SourceId::Server => &self.server,
        }
    }

    pub fn direction_mut(&mut self, source: SourceId) -> &mut H2DirectionState {
        match source {
            SourceId::Client => &mut self.client,
            SourceId::Server => &mut self.server,
        }
    }
}

/// Classification of parse errors (public API)
#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    /// HPACK decompression failed (detail in the `String`)
    Http2HpackError(String),
    /// Decoded header list exceeds the configured size limits
    Http2HeaderListTooLarge,
    /// Frame has an invalid structure for its type
    Http2InvalidFrame,
    /// Padded frame has missing or invalid padding
    Http2PaddingError,
    /// PRIORITY flag present but header block too short for priority fields
    Http2PriorityError,
    /// Internal buffer would exceed the configured max_buffer_size
    Http2BufferTooLarge,
    /// Expected a CONTINUATION frame but received a different frame type or
    /// wrong stream
    Http2ContinuationExpected,
    /// CONTINUATION frame without a preceding HEADERS frame
    Http2UnexpectedContinuation,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http2HpackError(msg) => write!(f, "HTTP/2 HPACK decoding error: {msg}"),
            Self::Http2HeaderListTooLarge => write!(f, "HTTP/2 header list exceeds size limits"),
            Self::Http2InvalidFrame => write!(f, "HTTP/2 invalid frame"),
            Self::Http2PaddingError => write!(f, "HTTP/2 frame has missing or invalid padding"),
            Self::Http2PriorityError => {
                write!(f, "HTTP/2 PRIORITY flag present but header block too short")
            },
            Self::Http2BufferTooLarge => {
                write!(f, "HTTP/2 internal buffer exceeds max_buffer_size")
            },
            Self::Http2ContinuationExpected => {
                write!(
                    f,
                    "HTTP/2 expected CONTINUATION frame but received different frame type or \
                     stream"
                )
            },
            Self::Http2UnexpectedContinuation => {
                write!(f, "HTTP/2 CONTINUATION frame without preceding HEADERS")
            },
        }
    }
}

/// Parse error with optional stream context (public API)
#[derive(Debug, Clone)]
pub struct ParseError {
    /// What went wrong
    pub kind:      ParseErrorKind,
    /// The stream that caused the error, if applicable
    pub stream_id: Option<StreamId>,
}

impl ParseError {
    /// Create a connection-level parse error (no specific stream).
    pub fn new(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            stream_id: None,
        }
    }

    /// Create a stream-level parse error with the offending stream ID.
    pub fn with_stream(kind: ParseErrorKind, stream_id: StreamId) -> Self {
        Self {
            kind,
            stream_id: Some(stream_id),
        }
    }

    /// Errors after which the direction cannot be parsed any further
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::Http2HpackError(_)
                | ParseErrorKind::Http2ContinuationExpected
                | ParseErrorKind::Http2BufferTooLarge
        )
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(sid) = self.stream_id {
            write!(f, "[stream {sid}] {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl std::error::Error for ParseError {}
