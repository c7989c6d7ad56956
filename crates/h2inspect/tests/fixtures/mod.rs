#![allow(clippy::vec_init_then_push, dead_code)]
//! HTTP/2 frame building helpers for tests
//!
//! These functions construct raw HTTP/2 frames byte by byte so the inspector
//! can be driven through exact frame boundaries.

pub const FRAME_TYPE_DATA: u8 = 0x00;
pub const FRAME_TYPE_HEADERS: u8 = 0x01;
pub const FRAME_TYPE_SETTINGS: u8 = 0x04;
pub const FRAME_TYPE_PUSH_PROMISE: u8 = 0x05;
pub const FRAME_TYPE_WINDOW_UPDATE: u8 = 0x08;
pub const FRAME_TYPE_CONTINUATION: u8 = 0x09;

pub const FLAG_END_STREAM: u8 = 0x01;
pub const FLAG_END_HEADERS: u8 = 0x04;
pub const FLAG_PADDED: u8 = 0x08;
pub const FLAG_PRIORITY: u8 = 0x20;

/// Build a raw HTTP/2 frame header (9 bytes)
fn build_frame_header(length: u32, frame_type: u8, flags: u8, stream_id: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(9);
    // Length (24-bit)
    header.push((length >> 16) as u8);
    header.push((length >> 8) as u8);
    header.push(length as u8);
    header.push(frame_type);
    header.push(flags);
    // Stream ID (31-bit, high bit reserved)
    header.push((stream_id >> 24) as u8 & 0x7F);
    header.push((stream_id >> 16) as u8);
    header.push((stream_id >> 8) as u8);
    header.push(stream_id as u8);
    header
}

pub fn build_data_frame(stream_id: u32, data: &[u8], end_stream: bool) -> Vec<u8> {
    let flags = if end_stream { FLAG_END_STREAM } else { 0 };
    let mut frame = build_frame_header(data.len() as u32, FRAME_TYPE_DATA, flags, stream_id);
    frame.extend_from_slice(data);
    frame
}

/// Build a HEADERS frame
///
/// # Arguments
/// * `stream_id` - Stream identifier
/// * `hpack_block` - HPACK-encoded header block
/// * `flags` - Frame flags (END_STREAM, END_HEADERS)
pub fn build_headers_frame(stream_id: u32, hpack_block: &[u8], flags: u8) -> Vec<u8> {
    let mut frame = build_frame_header(
        hpack_block.len() as u32,
        FRAME_TYPE_HEADERS,
        flags,
        stream_id,
    );
    frame.extend_from_slice(hpack_block);
    frame
}

/// HEADERS frame with END_HEADERS and END_STREAM
pub fn build_complete_headers_frame(stream_id: u32, hpack_block: &[u8]) -> Vec<u8> {
    build_headers_frame(stream_id, hpack_block, FLAG_END_HEADERS | FLAG_END_STREAM)
}

/// Build a HEADERS frame with both PADDED and PRIORITY flags
pub fn build_headers_frame_padded_priority(
    stream_id: u32,
    hpack_block: &[u8],
    padding_len: u8,
    end_headers: bool,
) -> Vec<u8> {
    let mut flags = FLAG_PADDED | FLAG_PRIORITY | FLAG_END_STREAM;
    if end_headers {
        flags |= FLAG_END_HEADERS;
    }
    // Layout: [Pad Length (1)] [E + Stream Dep (4)] [Weight (1)] [Header Block]
    // [Padding]
    let total_len = 1 + 5 + hpack_block.len() + padding_len as usize;
    let mut frame = build_frame_header(total_len as u32, FRAME_TYPE_HEADERS, flags, stream_id);
    frame.push(padding_len);
    frame.extend_from_slice(&0u32.to_be_bytes());
    frame.push(15);
    frame.extend_from_slice(hpack_block);
    frame.extend(std::iter::repeat_n(0u8, padding_len as usize));
    frame
}

/// Build a CONTINUATION frame
pub fn build_continuation_frame(stream_id: u32, hpack_block: &[u8], end_headers: bool) -> Vec<u8> {
    let flags = if end_headers { FLAG_END_HEADERS } else { 0 };
    let mut frame = build_frame_header(
        hpack_block.len() as u32,
        FRAME_TYPE_CONTINUATION,
        flags,
        stream_id,
    );
    frame.extend_from_slice(hpack_block);
    frame
}

/// Build a PUSH_PROMISE frame (server to client)
pub fn build_push_promise_frame(stream_id: u32, promised_id: u32, hpack_block: &[u8]) -> Vec<u8> {
    let mut frame = build_frame_header(
        4 + hpack_block.len() as u32,
        FRAME_TYPE_PUSH_PROMISE,
        FLAG_END_HEADERS,
        stream_id,
    );
    frame.extend_from_slice(&(promised_id & 0x7FFFFFFF).to_be_bytes());
    frame.extend_from_slice(hpack_block);
    frame
}

pub fn build_empty_settings_frame() -> Vec<u8> {
    build_frame_header(0, FRAME_TYPE_SETTINGS, 0, 0)
}

pub fn build_window_update_frame(stream_id: u32, increment: u32) -> Vec<u8> {
    let mut frame = build_frame_header(4, FRAME_TYPE_WINDOW_UPDATE, 0, stream_id);
    frame.extend_from_slice(&(increment & 0x7FFFFFFF).to_be_bytes());
    frame
}

/// HPACK helper: literal header with incremental indexing, new name
///
/// Adds the entry to the dynamic table. Format: 0b01xxxxxx
pub fn hpack_literal_with_indexing(name: &str, value: &str) -> Vec<u8> {
    let mut encoded = Vec::new();
    encoded.push(0x40);
    encoded.push(name.len() as u8);
    encoded.extend_from_slice(name.as_bytes());
    encoded.push(value.len() as u8);
    encoded.extend_from_slice(value.as_bytes());
    encoded
}

/// HPACK helper: literal header without indexing, new name
pub fn hpack_literal_without_indexing(name: &str, value: &str) -> Vec<u8> {
    let mut encoded = Vec::new();
    encoded.push(0x00);
    encoded.push(name.len() as u8);
    encoded.extend_from_slice(name.as_bytes());
    encoded.push(value.len() as u8);
    encoded.extend_from_slice(value.as_bytes());
    encoded
}

/// HPACK helper: literal header without indexing, name from the static
/// table (4-bit prefix, indices 1-14)
pub fn hpack_literal_indexed_name(name_index: u8, value: &str) -> Vec<u8> {
    let mut encoded = Vec::new();
    encoded.push(name_index & 0x0F);
    encoded.push(value.len() as u8);
    encoded.extend_from_slice(value.as_bytes());
    encoded
}

/// HPACK helper: indexed header field (single byte for indices 1-127)
pub fn hpack_indexed(index: u8) -> Vec<u8> {
    vec![0x80 | index]
}

/// Static table entries used by the tests (RFC 7541 Appendix A)
pub mod hpack_static {
    pub const AUTHORITY: u8 = 1;
    pub const METHOD_GET: u8 = 2;
    pub const METHOD_POST: u8 = 3;
    pub const PATH_ROOT: u8 = 4;
    pub const PATH_INDEX_HTML: u8 = 5;
    pub const SCHEME_HTTP: u8 = 6;
    pub const SCHEME_HTTPS: u8 = 7;
    pub const STATUS_200: u8 = 8;
}

/// Minimal HPACK block for a GET request in absolute form
pub fn hpack_get_request(path: &str, authority: &str) -> Vec<u8> {
    let mut block = Vec::new();
    block.extend(hpack_indexed(hpack_static::METHOD_GET));
    block.extend(hpack_indexed(hpack_static::SCHEME_HTTPS));
    if path == "/" {
        block.extend(hpack_indexed(hpack_static::PATH_ROOT));
    } else {
        block.extend(hpack_literal_indexed_name(hpack_static::PATH_ROOT, path));
    }
    block.extend(hpack_literal_indexed_name(hpack_static::AUTHORITY, authority));
    block
}

/// Preface plus an empty SETTINGS frame
pub fn connection_start() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(h2inspect::CONNECTION_PREFACE);
    data.extend(build_empty_settings_frame());
    data
}
