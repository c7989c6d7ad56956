//! Flow and packet context seen by the injector

use bytes::Bytes;
use h2inspect::{H2FlowData, SourceId, StreamId};

/// Inspector names recognized when an inspector is attached to a flow
pub const HTTP_INSPECTOR: &str = "http_inspect";
pub const HTTP2_INSPECTOR: &str = "http2_inspect";

/// Application protocol of a flow, resolved once from its inspector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProtocolId {
    #[default]
    Http1,
    Http2,
    Unidentified,
}

impl ProtocolId {
    /// Map the attached inspector's name to a protocol.
    ///
    /// A flow without an inspector is treated as HTTP/1.
    pub fn from_inspector_name(name: Option<&str>) -> Self {
        match name {
            None | Some(HTTP_INSPECTOR) => Self::Http1,
            Some(HTTP2_INSPECTOR) => Self::Http2,
            Some(_) => Self::Unidentified,
        }
    }
}

/// Whether traffic on a flow is still forwarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockingState {
    #[default]
    Normal,
    /// Terminal: an injection was attempted on this flow
    Blocked,
}

/// A tracked connection.
///
/// HTTP/2 flows own their [`H2FlowData`]; the HTTP/2 inspector feeds it and
/// the injector only reads the frame progress flags.
#[derive(Default)]
pub struct Flow {
    blocking_state: BlockingState,
    protocol:       ProtocolId,
    h2:             Option<H2FlowData>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an inspector by name, resolving the flow's protocol.
    ///
    /// Attaching the HTTP/2 inspector creates the flow's session data if it
    /// does not exist yet.
    pub fn attach_inspector(&mut self, name: Option<&str>) {
        self.protocol = ProtocolId::from_inspector_name(name);
        if self.protocol == ProtocolId::Http2 && self.h2.is_none() {
            self.h2 = Some(H2FlowData::new());
        }
    }

    /// Replace the HTTP/2 session data, e.g. to apply custom limits.
    pub fn set_h2_data(&mut self, data: H2FlowData) {
        self.h2 = Some(data);
    }

    pub fn protocol(&self) -> ProtocolId {
        self.protocol
    }

    pub fn blocking_state(&self) -> BlockingState {
        self.blocking_state
    }

    pub fn is_blocked(&self) -> bool {
        self.blocking_state == BlockingState::Blocked
    }

    pub fn h2_data(&self) -> Option<&H2FlowData> {
        self.h2.as_ref()
    }

    pub fn h2_data_mut(&mut self) -> Option<&mut H2FlowData> {
        self.h2.as_mut()
    }

    /// True when `source` is partway through a frame or a header block, or
    /// its parsing failed. Flows without session data are never mid-frame.
    pub(crate) fn h2_mid_frame(&self, source: SourceId) -> bool {
        self.h2.as_ref().is_some_and(|h2| h2.mid_frame(source))
    }

    pub(crate) fn block(&mut self) {
        self.blocking_state = BlockingState::Blocked;
    }
}

/// The packet an injection is performed on
#[derive(Debug, Clone, Copy, Default)]
pub struct Packet {
    /// TCP stream reassembly is established for this packet's flow
    pub stream_established: bool,
    /// The packet was sent by the server
    pub from_server:        bool,
}

impl Packet {
    pub fn new(stream_established: bool, from_server: bool) -> Self {
        Self {
            stream_established,
            from_server,
        }
    }
}

/// What to inject: the HTTP/1 block page and, for HTTP/2, the target stream
#[derive(Debug, Clone, Default)]
pub struct InjectionControl {
    pub page:      Bytes,
    /// Zero when unset; only meaningful on HTTP/2 flows
    pub stream_id: StreamId,
}

impl InjectionControl {
    pub fn new(page: impl Into<Bytes>) -> Self {
        Self {
            page:      page.into(),
            stream_id: StreamId(0),
        }
    }

    pub fn with_stream_id(mut self, stream_id: impl Into<StreamId>) -> Self {
        self.stream_id = stream_id.into();
        self
    }

    pub fn page_len(&self) -> usize {
        self.page.len()
    }
}
