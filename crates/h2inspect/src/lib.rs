// HTTP/2 inspection crate
// Normalizes HTTP/2 requests into HTTP/1-style request lines, tracks per-direction
// frame progress and translates HTTP/1 block pages into HTTP/2 frames

mod frame;
mod infraction;
mod parse;
mod pseudo;
mod request_line;
mod state;
mod translate;

#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_warn;

#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_debug;

pub use frame::{CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE, is_http2_preface};
pub use infraction::{Http2Event, Infraction, InfractionLog};
pub use pseudo::{PseudoHeaderField, PseudoHeaderName, PseudoHeaderTracker};
pub use request_line::{
    CanonicalRequestLine,
    HTTP2_VERSION,
    RequestHeaderDriver,
    RequestLineOutcome,
    UriForm,
    synthesize,
};
pub use state::{
    H2DirectionState,
    H2FlowData,
    H2Limits,
    ParseError,
    ParseErrorKind,
    SourceId,
    StreamId,
};
pub use translate::{Http1PageTranslator, PageTranslator, TranslationError, TranslationLimits};
