//! Fuzz target: Block page translation
//!
//! Feeds random bytes to the HTTP/1 to HTTP/2 page translator. Whenever a page
//! translates, the output must parse as complete server frames.

#![no_main]

use h2inspect::{H2FlowData, Http1PageTranslator, PageTranslator, SourceId, StreamId};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let translator = Http1PageTranslator::new();

    let Ok(frames) = translator.translate(data, StreamId(1)) else {
        return;
    };

    let mut flow = H2FlowData::new();
    flow.feed(SourceId::Server, &frames)
        .expect("translated page must parse");
    assert!(!flow.reading_frame(SourceId::Server));
    assert!(!flow.continuation_expected(SourceId::Server));
});
