//! Block-page injection for HTTP/1 and HTTP/2 flows
//!
//! Sends an operator-supplied HTTP/1 block page as the response on a flow the
//! detection engine decided to terminate. HTTP/2 flows get the page translated
//! into HEADERS + DATA frames for a client stream, provided the server side is
//! at a frame boundary.
//!
//! # Usage
//!
//! Implement [`ActiveResponse`] for your packet pipeline, then call
//! [`PayloadInjector::inject`]:
//!
//! ```ignore
//! use payload_injector::{Flow, InjectionControl, Packet, PayloadInjector};
//!
//! let injector = PayloadInjector::default();
//! injector.set_configured(true);
//!
//! let mut flow = Flow::new();
//! flow.attach_inspector(Some("http2_inspect"));
//!
//! let control = InjectionControl::new(block_page).with_stream_id(1);
//! let status = injector.inject(&mut flow, &Packet::new(true, true), &control, &mut active);
//! if let Err(e) = status {
//!     eprintln!("{}", e);
//! }
//! assert!(flow.is_blocked());
//! ```

mod counters;
mod error;
mod flow;
mod traits;

#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub use counters::{CounterSnapshot, InjectionCounters};
pub use error::{InjectionError, InjectionStatus};
pub use flow::{
    BlockingState,
    Flow,
    HTTP2_INSPECTOR,
    HTTP_INSPECTOR,
    InjectionControl,
    Packet,
    ProtocolId,
};
pub use h2inspect::{Http1PageTranslator, PageTranslator, TranslationError};
pub use traits::{ActiveResponse, SendDirection};

use h2inspect::SourceId;
use std::sync::atomic::{AtomicBool, Ordering};

/// Text for an injection outcome; `None` for success.
pub fn get_err_string(status: &InjectionStatus) -> Option<&'static str> {
    status.as_ref().err().map(InjectionError::as_str)
}

/// Injects block pages into flows and counts the outcomes.
///
/// Generic over the [`PageTranslator`] used for HTTP/2 flows. One instance
/// can be shared between workers; each `inject` call needs exclusive access
/// to its flow only.
pub struct PayloadInjector<T: PageTranslator = Http1PageTranslator> {
    translator: T,
    configured: AtomicBool,
    counters:   InjectionCounters,
}

impl Default for PayloadInjector<Http1PageTranslator> {
    fn default() -> Self {
        Self::new(Http1PageTranslator::new())
    }
}

impl<T: PageTranslator> PayloadInjector<T> {
    /// Create an unconfigured injector
    pub fn new(translator: T) -> Self {
        Self {
            translator,
            configured: AtomicBool::new(false),
            counters: InjectionCounters::default(),
        }
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Relaxed);
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Relaxed)
    }

    pub fn counters(&self) -> &InjectionCounters {
        &self.counters
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Inject `control.page` as the response on `flow`.
    ///
    /// Whatever the outcome, the flow ends up [`BlockingState::Blocked`], the
    /// session is blocked and detection is disabled for the packet.
    pub fn inject(
        &self,
        flow: &mut Flow,
        packet: &Packet,
        control: &InjectionControl,
        active: &mut dyn ActiveResponse,
    ) -> InjectionStatus {
        let status = self.try_inject(flow, packet, control, active);

        flow.block();
        active.block_session();
        active.disable_detection();

        match status {
            Ok(()) => {
                trace_debug!(
                    protocol = ?flow.protocol(),
                    stream_id = %control.stream_id,
                    page_len = control.page_len(),
                    "block page injected"
                );
            },
            Err(_e) => {
                trace_warn!(
                    protocol = ?flow.protocol(),
                    stream_id = %control.stream_id,
                    error = %_e,
                    "block page injection failed"
                );
            },
        }
        status
    }

    fn try_inject(
        &self,
        flow: &Flow,
        packet: &Packet,
        control: &InjectionControl,
        active: &mut dyn ActiveResponse,
    ) -> InjectionStatus {
        if !self.is_configured() {
            return Err(InjectionError::NotConfigured);
        }
        if !packet.stream_established {
            return Err(InjectionError::StreamNotEstablished);
        }

        let direction = SendDirection::toward_client(packet.from_server);
        match flow.protocol() {
            ProtocolId::Http2 => self.inject_http2(flow, control, direction, active),
            ProtocolId::Http1 => {
                active.send_data(direction, &control.page);
                InjectionCounters::bump(&self.counters.http_injects);
                Ok(())
            },
            ProtocolId::Unidentified => Err(InjectionError::UnidentifiedProtocol),
        }
    }

    fn inject_http2(
        &self,
        flow: &Flow,
        control: &InjectionControl,
        direction: SendDirection,
        active: &mut dyn ActiveResponse,
    ) -> InjectionStatus {
        let stream_id = control.stream_id;
        if stream_id.is_connection() {
            return Err(InjectionError::Http2StreamId0);
        }
        if !stream_id.is_client_initiated() {
            return Err(InjectionError::Http2EvenStreamId);
        }
        if flow.h2_mid_frame(SourceId::Server) {
            InjectionCounters::bump(&self.counters.http2_mid_frame);
            return Err(InjectionError::Http2MidFrame);
        }

        let frames = self
            .translator
            .translate(&control.page, stream_id)
            .inspect_err(|_| InjectionCounters::bump(&self.counters.http2_translate_err))?;

        active.send_data(direction, &frames);
        InjectionCounters::bump(&self.counters.http2_injects);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
