//! Fuzz target: Structured frame and header generation
//!
//! Generates semi-valid HTTP/2 frames and pseudo-header sequences using the
//! Arbitrary trait. Inputs are structurally valid but carry random field
//! values, which reaches the header-block and request-line logic far more
//! often than raw bytes do.

#![no_main]

use arbitrary::Arbitrary;
use h2inspect::{
    CONNECTION_PREFACE,
    H2FlowData,
    HTTP2_VERSION,
    InfractionLog,
    RequestHeaderDriver,
    SourceId,
    UriForm,
};
use libfuzzer_sys::fuzz_target;

const FRAME_TYPE_DATA: u8 = 0x00;
const FRAME_TYPE_HEADERS: u8 = 0x01;
const FRAME_TYPE_SETTINGS: u8 = 0x04;

const FLAG_PADDED: u8 = 0x08;

/// A structured HTTP/2 frame for fuzzing
#[derive(Debug, Arbitrary)]
struct FuzzFrame {
    frame_type:  u8,
    flags:       u8,
    stream_id:   u32,
    payload:     Vec<u8>,
    add_padding: bool,
    padding_len: u8,
}

impl FuzzFrame {
    fn to_bytes(&self) -> Vec<u8> {
        let frame_type = self.frame_type % 10; // Valid frame types 0-9
        let stream_id = self.stream_id & 0x7FFFFFFF;

        let mut payload = self.payload.clone();
        let mut flags = self.flags;

        if self.add_padding && (frame_type == FRAME_TYPE_DATA || frame_type == FRAME_TYPE_HEADERS) {
            let pad_len = self.padding_len.min(200);
            flags |= FLAG_PADDED;
            let mut padded = vec![pad_len];
            padded.extend(&payload);
            padded.extend(std::iter::repeat_n(0u8, pad_len as usize));
            payload = padded;
        }
        payload.truncate(16384);

        let length = payload.len() as u32;
        let mut frame = Vec::with_capacity(9 + payload.len());
        frame.extend_from_slice(&length.to_be_bytes()[1..]);
        frame.push(frame_type);
        frame.push(flags);
        frame.extend_from_slice(&stream_id.to_be_bytes());
        frame.extend(&payload);
        frame
    }
}

/// One decoded header entry; pseudo-header names are drawn from a small set
/// so duplicates and ordering violations are common
#[derive(Debug, Arbitrary)]
enum FuzzHeader {
    Method(Vec<u8>),
    Scheme(Vec<u8>),
    Path(Vec<u8>),
    Authority(Vec<u8>),
    UnknownPseudo(Vec<u8>),
    Regular(Vec<u8>),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    include_preface: bool,
    frames:          Vec<FuzzFrame>,
    chunk_size:      u8,
    headers:         Vec<FuzzHeader>,
}

fn check_request_line(headers: &[FuzzHeader]) {
    let mut log = InfractionLog::new();
    let mut driver = RequestHeaderDriver::new();
    for header in headers {
        let (name, value): (&[u8], &[u8]) = match header {
            FuzzHeader::Method(v) => (b":method", v),
            FuzzHeader::Scheme(v) => (b":scheme", v),
            FuzzHeader::Path(v) => (b":path", v),
            FuzzHeader::Authority(v) => (b":authority", v),
            FuzzHeader::UnknownPseudo(v) => (b":protocol", v),
            FuzzHeader::Regular(v) => (b"x-fuzz", v),
        };
        driver.on_header(name, value, &mut log);
    }

    match driver.finish(&mut log) {
        Ok(line) => {
            let bytes = line.as_bytes();
            assert!(bytes.ends_with(b"\r\n"));
            assert!(bytes[..bytes.len() - 2].ends_with(HTTP2_VERSION));
            if line.form() == UriForm::Asterisk {
                assert!(bytes.windows(2).any(|w| w == b" *"));
            }
            assert!(log.is_empty());
        },
        Err(infraction) => assert!(log.contains(infraction)),
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut data = Vec::new();
    if input.include_preface {
        data.extend_from_slice(CONNECTION_PREFACE);
    }
    data.extend(&[0, 0, 0, FRAME_TYPE_SETTINGS, 0, 0, 0, 0, 0]);
    for frame in &input.frames {
        data.extend(frame.to_bytes());
    }

    let mut flow = H2FlowData::new();
    let chunk_size = usize::from(input.chunk_size.max(1));
    for chunk in data.chunks(chunk_size) {
        if flow.feed(SourceId::Client, chunk).is_err() {
            break;
        }
    }
    while let Some((stream_id, _)) = flow.direction_mut(SourceId::Client).try_pop() {
        assert!(stream_id.0 > 0);
    }

    check_request_line(&input.headers);
});
