//! Header-level protocol infractions and the detection events they raise

/// A protocol violation found while turning HTTP/2 pseudo-headers into a
/// request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Infraction {
    /// Unknown pseudo-header, duplicate pseudo-header, or a pseudo-header name
    /// arriving while the previous one still waits for its value
    InvalidPseudoHeader,
    /// The pseudo-headers present do not fit any request URI form
    PseudoHeaderUriFormMismatch,
    /// A pseudo-header appeared after the first regular header
    PseudoHeaderAfterRegularHeader,
}

impl std::fmt::Display for Infraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPseudoHeader => write!(f, "invalid HTTP/2 pseudo-header"),
            Self::PseudoHeaderUriFormMismatch => {
                write!(f, "HTTP/2 pseudo-headers do not match any URI form")
            },
            Self::PseudoHeaderAfterRegularHeader => {
                write!(f, "HTTP/2 pseudo-header after regular header")
            },
        }
    }
}

impl std::error::Error for Infraction {}

/// Detection events raised alongside infractions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Http2Event {
    /// HTTP/2 message is malformed
    MisformattedHttp2,
}

/// Infractions and events accumulated for one direction of a flow.
#[derive(Debug, Clone, Default)]
pub struct InfractionLog {
    infractions: Vec<Infraction>,
    events:      Vec<Http2Event>,
}

impl InfractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an infraction and raise the matching detection event.
    pub fn record(&mut self, infraction: Infraction) {
        crate::trace_warn!(%infraction, "HTTP/2 header infraction");
        self.infractions.push(infraction);
        self.events.push(Http2Event::MisformattedHttp2);
    }

    pub fn contains(&self, infraction: Infraction) -> bool {
        self.infractions.contains(&infraction)
    }

    pub fn infractions(&self) -> &[Infraction] {
        &self.infractions
    }

    pub fn events(&self) -> &[Http2Event] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.infractions.is_empty()
    }
}
