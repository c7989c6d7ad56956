use crate::state::{ParseError, ParseErrorKind, StreamId};


/// HTTP/2 connection preface: "PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"
pub const CONNECTION_PREFACE: &[u8; 24] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Frame types
pub(crate) const FRAME_TYPE_DATA: u8 = 0x00;
pub(crate) const FRAME_TYPE_HEADERS: u8 = 0x01;
pub(crate) const FRAME_TYPE_PUSH_PROMISE: u8 = 0x05;
pub(crate) const FRAME_TYPE_CONTINUATION: u8 = 0x09;

/// Frame flags
pub(crate) const FLAG_END_STREAM: u8 = 0x01;
pub(crate) const FLAG_END_HEADERS: u8 = 0x04;
pub(crate) const FLAG_PADDED: u8 = 0x08;
pub(crate) const FLAG_PRIORITY: u8 = 0x20;

/// Frame header size (9 bytes)
pub const FRAME_HEADER_SIZE: usize = 9;

/// Default SETTINGS_MAX_FRAME_SIZE (RFC 7540 §6.5.2)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16_384;

/// Maximum allowed frame payload length (2^24 - 1, per RFC 7540 §4.2)
pub(crate) const MAX_FRAME_PAYLOAD_LENGTH: u32 = (1 << 24) - 1;

/// Parsed HTTP/2 frame header
#[derive(Debug, Clone)]
pub(crate) struct FrameHeader {
    pub(crate) length:     u32,
    pub(crate) frame_type: u8,
    pub(crate) flags:      u8,
    pub(crate) stream_id:  StreamId,
}

/// Check if buffer starts with HTTP/2 connection preface
pub fn is_http2_preface(buffer: &[u8]) -> bool {
    buffer.len() >= CONNECTION_PREFACE.len() && buffer.starts_with(CONNECTION_PREFACE)
}

/// Parse the 9-byte frame header, or `None` while fewer than 9 bytes are
/// buffered.
///
/// Zero-length frames are valid per RFC 7540 (e.g., SETTINGS ACK, empty
/// DATA with END_STREAM, PING). This function does not reject length == 0.
pub(crate) fn parse_frame_header(buffer: &[u8]) -> Option<FrameHeader> {
    let buffer = buffer.get(..FRAME_HEADER_SIZE)?;

    let length = u32::from_be_bytes([0, buffer[0], buffer[1], buffer[2]]);
    let frame_type = buffer[3];
    let flags = buffer[4];
    let stream_id = StreamId(u32::from_be_bytes([
        buffer[5] & 0x7F,
        buffer[6],
        buffer[7],
        buffer[8],
    ]));

    Some(FrameHeader {
        length,
        frame_type,
        flags,
        stream_id,
    })
}

/// Append a 9-byte frame header to `out`.
///
/// The reserved bit of the stream identifier is always cleared. Callers are
/// responsible for keeping `length` within the 24-bit range.
pub(crate) fn write_frame_header(
    out: &mut Vec<u8>,
    length: usize,
    frame_type: u8,
    flags: u8,
    stream_id: StreamId,
) {
    debug_assert!(length as u32 <= MAX_FRAME_PAYLOAD_LENGTH);
    let length = length as u32;
    out.extend_from_slice(&length.to_be_bytes()[1..]);
    out.push(frame_type);
    out.push(flags);
    out.extend_from_slice(&(stream_id.0 & 0x7FFF_FFFF).to_be_bytes());
}

/// Strip the PADDED field (pad length byte and trailing padding) from a
/// frame payload.
pub(crate) fn strip_padding<'a>(
    header: &FrameHeader,
    payload: &'a [u8],
) -> Result<&'a [u8], ParseError> {
    if header.flags & FLAG_PADDED == 0 {
        return Ok(payload);
    }
    // Padded frame format: [Pad Length (1 byte)] [Data] [Padding]
    let Some((&pad_len, rest)) = payload.split_first() else {
        return Err(ParseError::with_stream(
            ParseErrorKind::Http2PaddingError,
            header.stream_id,
        ));
    };
    let pad_len = pad_len as usize;
    if pad_len > rest.len() {
        return Err(ParseError::with_stream(
            ParseErrorKind::Http2PaddingError,
            header.stream_id,
        ));
    }
    Ok(&rest[..rest.len() - pad_len])
}

/// Strip the PADDED and PRIORITY fields from a HEADERS frame payload,
/// returning the header block fragment.
pub(crate) fn headers_fragment<'a>(
    header: &FrameHeader,
    payload: &'a [u8],
) -> Result<&'a [u8], ParseError> {
    let fragment = strip_padding(header, payload)?;

    // PRIORITY flag: 4-byte stream dependency + 1-byte weight
    if header.flags & FLAG_PRIORITY != 0 {
        if fragment.len() < 5 {
            return Err(ParseError::with_stream(
                ParseErrorKind::Http2PriorityError,
                header.stream_id,
            ));
        }
        return Ok(&fragment[5..]);
    }

    Ok(fragment)
}

/// Strip padding and the promised stream id from a PUSH_PROMISE payload,
/// returning the header block fragment.
pub(crate) fn push_promise_fragment<'a>(
    header: &FrameHeader,
    payload: &'a [u8],
) -> Result<&'a [u8], ParseError> {
    let fragment = strip_padding(header, payload)?;
    fragment.get(4..).ok_or(ParseError::with_stream(
        ParseErrorKind::Http2InvalidFrame,
        header.stream_id,
    ))
}
