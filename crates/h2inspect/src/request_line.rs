//! Canonical HTTP/1-style request line built from HTTP/2 pseudo-headers

use bytes::Bytes;

use crate::infraction::{Infraction, InfractionLog};
use crate::pseudo::{PseudoHeaderField, PseudoHeaderName, PseudoHeaderTracker};

/// Version token used for every synthesized request line
pub const HTTP2_VERSION: &[u8] = b"HTTP/2.0";

const CONNECT: &[u8] = b"CONNECT";
const SP: &[u8] = b" ";
const CRLF: &[u8] = b"\r\n";
const SCHEME_SEPARATOR: &[u8] = b"://";
const EMPTY: &[u8] = b"";

/// Outcome of request-line synthesis for one message
pub type RequestLineOutcome = Result<CanonicalRequestLine, Infraction>;

/// Request-target form selected from the pseudo-headers (RFC 7230 §5.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriForm {
    /// `OPTIONS * HTTP/2.0`
    Asterisk,
    /// `CONNECT host:port HTTP/2.0`
    Authority,
    /// `GET https://host/path HTTP/2.0`
    Absolute,
    /// `GET /path HTTP/2.0`
    Origin,
}

/// `"<METHOD> <TARGET> HTTP/2.0\r\n"`, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequestLine {
    line: Bytes,
    form: UriForm,
}

impl CanonicalRequestLine {
    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn form(&self) -> UriForm {
        self.form
    }

    pub fn into_bytes(self) -> Bytes {
        self.line
    }
}

impl std::fmt::Display for CanonicalRequestLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.line).trim_end())
    }
}

/// Select the URI form for the collected pseudo-headers and build the
/// request line.
///
/// Precedence is strict; the first matching form wins and its unmet
/// preconditions fail the message rather than falling through:
///
/// 1. `:path` starting with `*` selects asterisk form and needs `:method`.
/// 2. `:method` equal to `CONNECT` selects authority form and needs
///    `:authority` without `:scheme` or `:path`.
/// 3. Otherwise `:method`, `:scheme` and `:path` are all required; absolute
///    form when `:authority` is present, origin form when it is not.
pub fn synthesize(tracker: &PseudoHeaderTracker) -> RequestLineOutcome {
    let method = tracker.value(PseudoHeaderField::Method);
    let scheme = tracker.value(PseudoHeaderField::Scheme);
    let path = tracker.value(PseudoHeaderField::Path);
    let authority = tracker.value(PseudoHeaderField::Authority);

    let (form, target): (UriForm, [&[u8]; 4]) = if path.first() == Some(&b'*') {
        if method.is_empty() {
            return Err(Infraction::PseudoHeaderUriFormMismatch);
        }
        (UriForm::Asterisk, [path, EMPTY, EMPTY, EMPTY])
    } else if method == CONNECT {
        if authority.is_empty() || !scheme.is_empty() || !path.is_empty() {
            return Err(Infraction::PseudoHeaderUriFormMismatch);
        }
        (UriForm::Authority, [authority, EMPTY, EMPTY, EMPTY])
    } else if !method.is_empty() && !scheme.is_empty() && !path.is_empty() {
        if authority.is_empty() {
            (UriForm::Origin, [path, EMPTY, EMPTY, EMPTY])
        } else {
            (UriForm::Absolute, [scheme, SCHEME_SEPARATOR, authority, path])
        }
    } else {
        return Err(Infraction::PseudoHeaderUriFormMismatch);
    };

    Ok(CanonicalRequestLine {
        line: assemble(method, &target),
        form,
    })
}

/// Write `METHOD SP TARGET SP VERSION CRLF` into one exactly-sized buffer.
fn assemble(method: &[u8], target: &[&[u8]]) -> Bytes {
    let target_len: usize = target.iter().map(|part| part.len()).sum();
    let total = method.len() + SP.len() + target_len + SP.len() + HTTP2_VERSION.len() + CRLF.len();

    let mut line = Vec::with_capacity(total);
    line.extend_from_slice(method);
    line.extend_from_slice(SP);
    for part in target {
        line.extend_from_slice(part);
    }
    line.extend_from_slice(SP);
    line.extend_from_slice(HTTP2_VERSION);
    line.extend_from_slice(CRLF);

    debug_assert_eq!(line.len(), total);
    debug_assert_eq!(line.capacity(), total);
    Bytes::from(line)
}

/// Drives a [`PseudoHeaderTracker`] over the decoded entries of one request
/// header block and produces the message's request line.
///
/// Feed every decoded `(name, value)` pair in header-block order with
/// [`on_header`](Self::on_header), then call [`finish`](Self::finish) at the
/// end of the block. Failures are recorded into the supplied
/// [`InfractionLog`].
#[derive(Debug, Default)]
pub struct RequestHeaderDriver {
    tracker:              PseudoHeaderTracker,
    outcome:              Option<RequestLineOutcome>,
    /// A regular header triggered synthesis; no pseudo-header may follow
    start_line_finalized: bool,
}

impl RequestHeaderDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one decoded header entry.
    pub fn on_header(&mut self, name: &[u8], value: &[u8], log: &mut InfractionLog) {
        if name.first() == Some(&b':') {
            self.on_pseudo_header(PseudoHeaderName::Raw(name), value, log);
        } else {
            self.on_regular_header(log);
        }
    }

    /// Process a pseudo-header whose name arrived as an HPACK static-table
    /// index.
    pub fn on_indexed_pseudo_header(&mut self, index: u64, value: &[u8], log: &mut InfractionLog) {
        self.on_pseudo_header(PseudoHeaderName::Indexed(index), value, log);
    }

    fn on_pseudo_header(
        &mut self,
        name: PseudoHeaderName<'_>,
        value: &[u8],
        log: &mut InfractionLog,
    ) {
        match self.outcome {
            Some(Err(Infraction::PseudoHeaderAfterRegularHeader)) => {},
            // Raised whether synthesis succeeded or failed, at most once
            Some(_) if self.start_line_finalized => {
                log.record(Infraction::PseudoHeaderAfterRegularHeader);
                self.outcome = Some(Err(Infraction::PseudoHeaderAfterRegularHeader));
            },
            // Message abandoned on an earlier name
            Some(_) => {},
            None => match self.tracker.observe_name(name) {
                Ok(()) => self.tracker.observe_value(Bytes::copy_from_slice(value)),
                Err(infraction) => {
                    log.record(infraction);
                    self.outcome = Some(Err(infraction));
                },
            },
        }
    }

    fn on_regular_header(&mut self, log: &mut InfractionLog) {
        if self.outcome.is_none() {
            self.outcome = Some(self.synthesize(log));
            self.start_line_finalized = true;
        }
    }

    fn synthesize(&self, log: &mut InfractionLog) -> RequestLineOutcome {
        let outcome = synthesize(&self.tracker);
        match &outcome {
            Ok(_line) => {
                crate::trace_debug!(request_line = %_line, "synthesized request line");
            },
            Err(infraction) => log.record(*infraction),
        }
        outcome
    }

    /// End of header block: synthesize if no regular header did already, and
    /// return the outcome for this message.
    pub fn finish(mut self, log: &mut InfractionLog) -> RequestLineOutcome {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.synthesize(log),
        }
    }
}
