//! Fuzz target: Raw byte parsing
//!
//! Feeds random bytes to both directions of an HTTP/2 flow.
//! The goal is to ensure the frame scanner never panics on arbitrary input.

#![no_main]

use h2inspect::{H2FlowData, SourceId};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut flow = H2FlowData::new();

    // We don't care about the result, only that it doesn't panic
    let _ = flow.feed(SourceId::Client, data);
    let _ = flow.feed(SourceId::Server, data);
    let _ = flow.reading_frame(SourceId::Client);
    let _ = flow.continuation_expected(SourceId::Server);
    while flow.direction_mut(SourceId::Client).try_pop().is_some() {}

    // Same bytes in two halves to exercise buffering across feeds
    if data.len() > 10 {
        let mut split = H2FlowData::new();
        let mid = data.len() / 2;
        let _ = split.feed(SourceId::Client, &data[..mid]);
        let _ = split.feed(SourceId::Client, &data[mid..]);
    }
});
