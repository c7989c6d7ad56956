//! Request pseudo-header accumulation

use bytes::Bytes;

use crate::infraction::Infraction;

pub(crate) const AUTHORITY_NAME: &[u8] = b":authority";
pub(crate) const METHOD_NAME: &[u8] = b":method";
pub(crate) const PATH_NAME: &[u8] = b":path";
pub(crate) const SCHEME_NAME: &[u8] = b":scheme";

/// The four request pseudo-header fields (RFC 7540 §8.1.2.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoHeaderField {
    Authority,
    Method,
    Path,
    Scheme,
}

impl PseudoHeaderField {
    /// Map an HPACK static-table index to the pseudo-header it names.
    ///
    /// Indices 1 through 7 cover `:authority`, both `:method` entries, both
    /// `:path` entries and both `:scheme` entries (RFC 7541 Appendix A).
    pub fn from_static_index(index: u64) -> Option<Self> {
        match index {
            1 => Some(Self::Authority),
            2 | 3 => Some(Self::Method),
            4 | 5 => Some(Self::Path),
            6 | 7 => Some(Self::Scheme),
            _ => None,
        }
    }

    /// Map a raw header name to a request pseudo-header. Matching is exact.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            AUTHORITY_NAME => Some(Self::Authority),
            METHOD_NAME => Some(Self::Method),
            PATH_NAME => Some(Self::Path),
            SCHEME_NAME => Some(Self::Scheme),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authority => ":authority",
            Self::Method => ":method",
            Self::Path => ":path",
            Self::Scheme => ":scheme",
        }
    }
}

/// A decoded pseudo-header name as delivered by the header decoder
#[derive(Debug, Clone, Copy)]
pub enum PseudoHeaderName<'a> {
    /// Compact form: HPACK static-table index
    Indexed(u64),
    /// Literal name bytes, including the leading colon
    Raw(&'a [u8]),
}

/// Accumulates the request pseudo-headers of one HTTP/2 message.
///
/// Names and values must arrive strictly paired: every successful
/// [`observe_name`](Self::observe_name) is followed by exactly one
/// [`observe_value`](Self::observe_value).
#[derive(Debug, Clone, Default)]
pub struct PseudoHeaderTracker {
    authority: Option<Bytes>,
    method:    Option<Bytes>,
    path:      Option<Bytes>,
    scheme:    Option<Bytes>,
    pending:   Option<PseudoHeaderField>,
}

impl PseudoHeaderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a pseudo-header name and mark its field as awaiting a value.
    ///
    /// Fails with [`Infraction::InvalidPseudoHeader`] when the name is not a
    /// request pseudo-header, when the field already holds a non-empty value,
    /// or when a previous name is still waiting for its value.
    pub fn observe_name(&mut self, name: PseudoHeaderName<'_>) -> Result<(), Infraction> {
        if self.pending.is_some() {
            return Err(Infraction::InvalidPseudoHeader);
        }

        let field = match name {
            PseudoHeaderName::Indexed(index) => PseudoHeaderField::from_static_index(index),
            PseudoHeaderName::Raw(raw) => PseudoHeaderField::from_name(raw),
        }
        .ok_or(Infraction::InvalidPseudoHeader)?;

        // An empty value counts as unset and may be replaced
        if self.get(field).is_some_and(|v| !v.is_empty()) {
            return Err(Infraction::InvalidPseudoHeader);
        }

        self.pending = Some(field);
        Ok(())
    }

    /// Store the value for the field named by the preceding
    /// [`observe_name`](Self::observe_name).
    ///
    /// # Panics
    ///
    /// Panics if no name is pending. The header decoder always delivers a
    /// value right after its name, so this indicates a broken driver.
    pub fn observe_value(&mut self, value: impl Into<Bytes>) {
        let Some(field) = self.pending.take() else {
            panic!("pseudo-header value delivered without a pending name");
        };
        let slot = match field {
            PseudoHeaderField::Authority => &mut self.authority,
            PseudoHeaderField::Method => &mut self.method,
            PseudoHeaderField::Path => &mut self.path,
            PseudoHeaderField::Scheme => &mut self.scheme,
        };
        *slot = Some(value.into());
    }

    /// Value of `field`, if one has been delivered.
    pub fn get(&self, field: PseudoHeaderField) -> Option<&Bytes> {
        match field {
            PseudoHeaderField::Authority => self.authority.as_ref(),
            PseudoHeaderField::Method => self.method.as_ref(),
            PseudoHeaderField::Path => self.path.as_ref(),
            PseudoHeaderField::Scheme => self.scheme.as_ref(),
        }
    }

    /// Field currently waiting for its value
    pub fn pending(&self) -> Option<PseudoHeaderField> {
        self.pending
    }

    /// Value of `field` as a byte slice, empty when absent.
    pub(crate) fn value(&self, field: PseudoHeaderField) -> &[u8] {
        self.get(field).map(|b| b.as_ref()).unwrap_or_default()
    }
}
