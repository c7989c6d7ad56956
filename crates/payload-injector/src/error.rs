use h2inspect::TranslationError;

/// Why an injection attempt failed. Success is `Ok(())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionError {
    /// The injector has not been configured
    NotConfigured,
    /// The TCP stream has not been established (no reassembly yet)
    StreamNotEstablished,
    /// The flow's inspector is neither HTTP/1 nor HTTP/2
    UnidentifiedProtocol,
    /// HTTP/2 target is the connection stream
    Http2StreamId0,
    /// HTTP/2 target is a server-initiated (even) stream
    Http2EvenStreamId,
    /// Server direction is in the middle of a frame or header block
    Http2MidFrame,
    /// Block page could not be translated to HTTP/2
    PageTranslation,
    /// Translated header block exceeds the configured maximum
    TranslatedHdrsSize,
    /// Block page body does not fit a single DATA frame
    Http2BodySize,
}

/// Outcome of [`PayloadInjector::inject`](crate::PayloadInjector::inject)
pub type InjectionStatus = Result<(), InjectionError>;

impl InjectionError {
    /// Fixed operator-facing text for this failure
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "Payload injector is not configured",
            Self::StreamNotEstablished => "TCP stream not established",
            Self::UnidentifiedProtocol => "Unidentified protocol",
            Self::Http2StreamId0 => "HTTP/2 - injection to stream 0",
            Self::Http2EvenStreamId => "HTTP/2 - injection to server initiated stream",
            Self::Http2MidFrame => "HTTP/2 - attempt to inject mid frame. Currently not supported.",
            Self::PageTranslation => {
                "Error in translating HTTP block page to HTTP/2. Unsupported or bad format."
            },
            Self::TranslatedHdrsSize => {
                "HTTP/2 translated header size is bigger than expected. Update max size."
            },
            Self::Http2BodySize => "HTTP/2 body is > 16k. Currently not supported.",
        }
    }
}

impl std::fmt::Display for InjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for InjectionError {}

impl From<TranslationError> for InjectionError {
    fn from(e: TranslationError) -> Self {
        match e {
            TranslationError::PageTranslation => Self::PageTranslation,
            TranslationError::TranslatedHdrsSize => Self::TranslatedHdrsSize,
            TranslationError::Http2BodySize => Self::Http2BodySize,
        }
    }
}
