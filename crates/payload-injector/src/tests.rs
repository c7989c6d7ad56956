use super::*;
use bytes::Bytes;
use h2inspect::{H2FlowData, StreamId};
use rstest::rstest;

/// Records everything the injector asks of the packet pipeline
#[derive(Default)]
struct RecordingActive {
    sent:               Vec<(SendDirection, Vec<u8>)>,
    blocked:            usize,
    detection_disabled: usize,
}

impl ActiveResponse for RecordingActive {
    fn send_data(&mut self, direction: SendDirection, data: &[u8]) -> usize {
        self.sent.push((direction, data.to_vec()));
        data.len()
    }

    fn block_session(&mut self) {
        self.blocked += 1;
    }

    fn disable_detection(&mut self) {
        self.detection_disabled += 1;
    }
}

/// Translator returning a fixed outcome
struct FixedTranslator(Result<&'static [u8], TranslationError>);

impl PageTranslator for FixedTranslator {
    fn translate(&self, _page: &[u8], _stream_id: StreamId) -> Result<Bytes, TranslationError> {
        self.0.map(Bytes::from_static)
    }
}

const PAGE: &[u8] = b"test";

fn configured_injector(
    translation: Result<&'static [u8], TranslationError>,
) -> PayloadInjector<FixedTranslator> {
    let injector = PayloadInjector::new(FixedTranslator(translation));
    injector.set_configured(true);
    injector
}

fn flow_with(inspector: Option<&str>) -> Flow {
    let mut flow = Flow::new();
    flow.attach_inspector(inspector);
    flow
}

fn established() -> Packet {
    Packet::new(true, false)
}

fn assert_blocked(flow: &Flow, active: &RecordingActive) {
    assert!(flow.is_blocked());
    assert_eq!(flow.blocking_state(), BlockingState::Blocked);
    assert_eq!(active.blocked, 1);
    assert_eq!(active.detection_disabled, 1);
}

// =========================================================================
// Precondition failures
// =========================================================================

#[rstest]
#[case::stream_not_established(false)]
#[case::stream_established(true)]
fn test_not_configured(#[case] stream_established: bool) {
    let injector = PayloadInjector::new(FixedTranslator(Ok(b"x".as_slice())));
    let mut flow = flow_with(Some(HTTP_INSPECTOR));
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &Packet::new(stream_established, false),
        &InjectionControl::new(PAGE),
        &mut active,
    );

    assert_eq!(status, Err(InjectionError::NotConfigured));
    assert_eq!(
        get_err_string(&status),
        Some("Payload injector is not configured")
    );
    assert_eq!(injector.counters().snapshot(), CounterSnapshot::default());
    assert!(active.sent.is_empty());
    assert_blocked(&flow, &active);
}

#[test]
fn test_stream_not_established() {
    let injector = configured_injector(Ok(b"x".as_slice()));
    let mut flow = flow_with(Some(HTTP_INSPECTOR));
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &Packet::new(false, false),
        &InjectionControl::new(PAGE),
        &mut active,
    );

    assert_eq!(status, Err(InjectionError::StreamNotEstablished));
    assert_eq!(
        status.unwrap_err().to_string(),
        "TCP stream not established"
    );
    assert_eq!(injector.counters().snapshot().http_injects, 0);
    assert_blocked(&flow, &active);
}

#[test]
fn test_unidentified_inspector() {
    let injector = configured_injector(Ok(b"x".as_slice()));
    let mut flow = flow_with(Some("inspector"));
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE),
        &mut active,
    );

    assert_eq!(status, Err(InjectionError::UnidentifiedProtocol));
    assert_eq!(injector.counters().snapshot(), CounterSnapshot::default());
    assert!(active.sent.is_empty());
    assert_blocked(&flow, &active);
}

// =========================================================================
// HTTP/1
// =========================================================================

#[rstest]
#[case::http_inspect(Some(HTTP_INSPECTOR))]
#[case::no_inspector(None)]
fn test_http1_success(#[case] inspector: Option<&str>) {
    let injector = configured_injector(Err(TranslationError::PageTranslation));
    let mut flow = flow_with(inspector);
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE),
        &mut active,
    );

    assert_eq!(status, Ok(()));
    assert_eq!(get_err_string(&status), None);
    assert_eq!(
        injector.counters().snapshot(),
        CounterSnapshot {
            http_injects: 1,
            ..CounterSnapshot::default()
        }
    );
    // Page goes out unchanged, towards the client
    assert_eq!(active.sent, vec![(SendDirection::Reverse, PAGE.to_vec())]);
    assert_blocked(&flow, &active);
}

#[rstest]
#[case::from_client(false, SendDirection::Reverse)]
#[case::from_server(true, SendDirection::Forward)]
fn test_send_direction(#[case] from_server: bool, #[case] expected: SendDirection) {
    let injector = configured_injector(Ok(b"x".as_slice()));
    let mut flow = flow_with(Some(HTTP_INSPECTOR));
    let mut active = RecordingActive::default();

    injector
        .inject(
            &mut flow,
            &Packet::new(true, from_server),
            &InjectionControl::new(PAGE),
            &mut active,
        )
        .unwrap();

    assert_eq!(active.sent[0].0, expected);
}

// =========================================================================
// HTTP/2
// =========================================================================

#[rstest]
#[case::stream_0(0, InjectionError::Http2StreamId0, "HTTP/2 - injection to stream 0")]
#[case::even_stream(
    2,
    InjectionError::Http2EvenStreamId,
    "HTTP/2 - injection to server initiated stream"
)]
fn test_http2_bad_stream_id(
    #[case] stream_id: u32,
    #[case] expected: InjectionError,
    #[case] text: &str,
) {
    let injector = configured_injector(Ok(b"x".as_slice()));
    let mut flow = flow_with(Some(HTTP2_INSPECTOR));
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE).with_stream_id(stream_id),
        &mut active,
    );

    assert_eq!(status, Err(expected));
    assert_eq!(get_err_string(&status), Some(text));
    assert_eq!(injector.counters().snapshot(), CounterSnapshot::default());
    assert!(active.sent.is_empty());
    assert_blocked(&flow, &active);
}

#[test]
fn test_http2_success() {
    let injector = configured_injector(Ok(b"frames".as_slice()));
    let mut flow = flow_with(Some(HTTP2_INSPECTOR));
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE).with_stream_id(1),
        &mut active,
    );

    assert_eq!(status, Ok(()));
    assert_eq!(
        injector.counters().snapshot(),
        CounterSnapshot {
            http2_injects: 1,
            ..CounterSnapshot::default()
        }
    );
    assert_eq!(active.sent, vec![(SendDirection::Reverse, b"frames".to_vec())]);
    assert_blocked(&flow, &active);
}

/// Server direction left with a partial HEADERS frame
fn server_reading_frame() -> H2FlowData {
    let mut h2 = H2FlowData::new();
    h2.feed(SourceId::Server, &[0x00, 0x00, 0x05, 0x01, 0x04]).unwrap();
    h2
}

/// Server direction left between HEADERS and its CONTINUATION
fn server_continuation_expected() -> H2FlowData {
    let mut h2 = H2FlowData::new();
    // HEADERS, stream 1, no END_HEADERS, `:status: 200`
    h2.feed(
        SourceId::Server,
        &[0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01, 0x88],
    )
    .unwrap();
    h2
}

/// Server direction whose header block failed to decode
fn server_hpack_failed() -> H2FlowData {
    let mut h2 = H2FlowData::new();
    // HEADERS, stream 1, END_HEADERS, index 63 with an empty dynamic table
    let frame = [0x00, 0x00, 0x01, 0x01, 0x04, 0x00, 0x00, 0x00, 0x01, 0xBF];
    assert!(h2.feed(SourceId::Server, &frame).is_err());
    h2
}

#[rstest]
#[case::reading_frame(server_reading_frame())]
#[case::continuation_expected(server_continuation_expected())]
#[case::hpack_failed(server_hpack_failed())]
fn test_http2_mid_frame(#[case] h2: H2FlowData) {
    let injector = configured_injector(Ok(b"frames".as_slice()));
    let mut flow = flow_with(Some(HTTP2_INSPECTOR));
    flow.set_h2_data(h2);
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE).with_stream_id(1),
        &mut active,
    );

    assert_eq!(status, Err(InjectionError::Http2MidFrame));
    assert_eq!(
        get_err_string(&status),
        Some("HTTP/2 - attempt to inject mid frame. Currently not supported.")
    );
    assert_eq!(
        injector.counters().snapshot(),
        CounterSnapshot {
            http2_mid_frame: 1,
            ..CounterSnapshot::default()
        }
    );
    assert!(active.sent.is_empty());
    assert_blocked(&flow, &active);
}

#[test]
fn test_http2_client_mid_frame_does_not_matter() {
    let injector = configured_injector(Ok(b"frames".as_slice()));
    let mut flow = flow_with(Some(HTTP2_INSPECTOR));
    flow.h2_data_mut()
        .unwrap()
        .feed(SourceId::Client, &h2inspect::CONNECTION_PREFACE[..8])
        .unwrap();
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE).with_stream_id(3),
        &mut active,
    );

    assert_eq!(status, Ok(()));
    assert!(flow.h2_data().unwrap().reading_frame(SourceId::Client));
}

#[rstest]
#[case::page_translation(
    TranslationError::PageTranslation,
    InjectionError::PageTranslation,
    "Error in translating HTTP block page to HTTP/2. Unsupported or bad format."
)]
#[case::headers_size(
    TranslationError::TranslatedHdrsSize,
    InjectionError::TranslatedHdrsSize,
    "HTTP/2 translated header size is bigger than expected. Update max size."
)]
#[case::body_size(
    TranslationError::Http2BodySize,
    InjectionError::Http2BodySize,
    "HTTP/2 body is > 16k. Currently not supported."
)]
fn test_http2_translation_error(
    #[case] translation: TranslationError,
    #[case] expected: InjectionError,
    #[case] text: &str,
) {
    let injector = configured_injector(Err(translation));
    let mut flow = flow_with(Some(HTTP2_INSPECTOR));
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established(),
        &InjectionControl::new(PAGE).with_stream_id(1),
        &mut active,
    );

    assert_eq!(status, Err(expected));
    assert_eq!(get_err_string(&status), Some(text));
    assert_eq!(
        injector.counters().snapshot(),
        CounterSnapshot {
            http2_translate_err: 1,
            ..CounterSnapshot::default()
        }
    );
    assert!(active.sent.is_empty());
    assert_blocked(&flow, &active);
}

#[test]
fn test_repeated_failures_touch_one_counter() {
    let injector = configured_injector(Ok(b"frames".as_slice()));
    for _ in 0..3 {
        let mut flow = flow_with(Some(HTTP2_INSPECTOR));
        flow.set_h2_data(server_reading_frame());
        let mut active = RecordingActive::default();
        let _ = injector.inject(
            &mut flow,
            &established(),
            &InjectionControl::new(PAGE).with_stream_id(1),
            &mut active,
        );
    }

    assert_eq!(
        injector.counters().snapshot(),
        CounterSnapshot {
            http2_mid_frame: 3,
            ..CounterSnapshot::default()
        }
    );
}

#[test]
fn test_http2_with_real_translator() {
    let injector: PayloadInjector = PayloadInjector::default();
    injector.set_configured(true);
    let mut flow = flow_with(Some(HTTP2_INSPECTOR));
    let mut active = RecordingActive::default();

    let page = "HTTP/1.1 403 Forbidden\r\nContent-Type: text/html\r\n\r\nblocked";
    let status = injector.inject(
        &mut flow,
        &Packet::new(true, true),
        &InjectionControl::new(page).with_stream_id(5),
        &mut active,
    );
    assert_eq!(status, Ok(()));

    let (direction, frames) = &active.sent[0];
    assert_eq!(*direction, SendDirection::Forward);
    // HEADERS on stream 5 first, then a 7-byte DATA frame ending the stream
    assert_eq!(frames[3], 0x01);
    assert_eq!(&frames[5..9], &[0, 0, 0, 5]);
    let data = &frames[frames.len() - 16..];
    assert_eq!(&data[..9], &[0, 0, 7, 0x00, 0x01, 0, 0, 0, 5]);
    assert_eq!(&data[9..], b"blocked");

    // The client-side view of the injected frames is a clean response
    let mut client_view = H2FlowData::new();
    client_view.feed(SourceId::Server, frames).unwrap();
    assert!(!client_view.reading_frame(SourceId::Server));
}

// =========================================================================
// Totality: every combination ends blocked and bumps at most one counter
// =========================================================================

#[rstest]
fn test_inject_total(
    #[values(false, true)] configured: bool,
    #[values(false, true)] stream_established: bool,
    #[values(None, Some(HTTP_INSPECTOR), Some(HTTP2_INSPECTOR), Some("ssl"))] inspector: Option<
        &str,
    >,
    #[values(0, 1, 2)] stream_id: u32,
    #[values(false, true)] mid_frame: bool,
    #[values(Ok(&b"frames"[..]), Err(TranslationError::Http2BodySize))] translation: Result<
        &'static [u8],
        TranslationError,
    >,
) {
    let injector = PayloadInjector::new(FixedTranslator(translation));
    injector.set_configured(configured);
    let mut flow = flow_with(inspector);
    if mid_frame {
        flow.set_h2_data(server_continuation_expected());
    }
    let mut active = RecordingActive::default();

    let status = injector.inject(
        &mut flow,
        &established_if(stream_established),
        &InjectionControl::new(PAGE).with_stream_id(stream_id),
        &mut active,
    );

    assert_blocked(&flow, &active);

    let snapshot = injector.counters().snapshot();
    let total = snapshot.http_injects
        + snapshot.http2_injects
        + snapshot.http2_translate_err
        + snapshot.http2_mid_frame;
    assert!(total <= 1);
    assert_eq!(status.is_ok(), active.sent.len() == 1);
    assert_eq!(
        status.is_ok(),
        snapshot.http_injects + snapshot.http2_injects == 1
    );
}

fn established_if(stream_established: bool) -> Packet {
    Packet::new(stream_established, false)
}

// =========================================================================
// Adapters
// =========================================================================

#[rstest]
#[case(None, ProtocolId::Http1)]
#[case(Some("http_inspect"), ProtocolId::Http1)]
#[case(Some("http2_inspect"), ProtocolId::Http2)]
#[case(Some("HTTP2_INSPECT"), ProtocolId::Unidentified)]
#[case(Some(""), ProtocolId::Unidentified)]
fn test_protocol_from_inspector_name(#[case] name: Option<&str>, #[case] expected: ProtocolId) {
    assert_eq!(ProtocolId::from_inspector_name(name), expected);
}

#[test]
fn test_attach_http2_creates_session_data_once() {
    let mut flow = Flow::new();
    assert!(flow.h2_data().is_none());

    flow.attach_inspector(Some(HTTP2_INSPECTOR));
    flow.h2_data_mut()
        .unwrap()
        .feed(SourceId::Server, &[0x00])
        .unwrap();

    // Re-attaching keeps the existing session state
    flow.attach_inspector(Some(HTTP2_INSPECTOR));
    assert!(flow.h2_data().unwrap().reading_frame(SourceId::Server));
    assert_eq!(flow.blocking_state(), BlockingState::Normal);
}

#[test]
fn test_control_defaults() {
    let control = InjectionControl::new(PAGE);
    assert_eq!(control.stream_id, StreamId(0));
    assert_eq!(control.page_len(), 4);
}

#[test]
fn test_translation_error_conversion() {
    assert_eq!(
        InjectionError::from(TranslationError::TranslatedHdrsSize),
        InjectionError::TranslatedHdrsSize
    );
}
