use crate::frame::*;
use crate::request_line::RequestHeaderDriver;
use crate::state::{
    H2DirectionState,
    ParseError,
    ParseErrorKind,
    PendingHeaderBlock,
    SourceId,
    StreamId,
};

/// Parse the internal buffer incrementally, called by
/// [`H2DirectionState::feed`].
///
/// Complete frames are consumed and removed from the buffer; a trailing
/// partial frame stays buffered, which is what `reading_frame` reports.
/// Structural frame errors (padding, priority, stray CONTINUATION) skip the
/// offending frame. Errors that leave the HPACK table or the frame boundaries
/// unknown stop parsing and are returned; the offending frame stays buffered.
pub(crate) fn parse_buffer_incremental(state: &mut H2DirectionState) -> Result<(), ParseError> {
    let mut pos = 0;
    let mut fatal_error: Option<ParseError> = None;

    if !state.preface_received {
        if state.buffer.len() < CONNECTION_PREFACE.len()
            && CONNECTION_PREFACE.starts_with(&state.buffer)
        {
            // Preface still arriving
            return Ok(());
        }
        if is_http2_preface(&state.buffer) {
            pos += CONNECTION_PREFACE.len();
        }
        // Without a preface the capture started mid-connection; frames follow
        state.preface_received = true;
    }

    while let Some(header) = parse_frame_header(&state.buffer[pos..]) {
        let frame_total_size = FRAME_HEADER_SIZE + header.length as usize;

        if pos + frame_total_size > state.buffer.len() {
            break; // Incomplete frame - wait for more data
        }

        let frame_payload = state.buffer[pos + FRAME_HEADER_SIZE..pos + frame_total_size].to_vec();

        if let Err(e) = handle_frame(state, &header, &frame_payload) {
            if e.is_fatal() {
                fatal_error = Some(e);
                break;
            }
            crate::trace_warn!(error = %e, "skipping malformed HTTP/2 frame");
        }
        pos += frame_total_size;
    }

    // Remove consumed bytes from buffer, keeping any partial frame data
    if pos > 0 {
        state.buffer.drain(..pos);
    }

    match fatal_error {
        Some(e) => {
            crate::trace_warn!(source = ?state.source, error = %e, "HTTP/2 parsing stopped");
            Err(e)
        },
        None => Ok(()),
    }
}

fn handle_frame(
    state: &mut H2DirectionState,
    header: &FrameHeader,
    payload: &[u8],
) -> Result<(), ParseError> {
    // RFC 7540 §6.10: nothing may interleave a HEADERS/CONTINUATION sequence
    if let Some(pending) = &state.pending_headers
        && (header.frame_type != FRAME_TYPE_CONTINUATION || header.stream_id != pending.stream_id)
    {
        return Err(ParseError::with_stream(
            ParseErrorKind::Http2ContinuationExpected,
            pending.stream_id,
        ));
    }

    match header.frame_type {
        FRAME_TYPE_HEADERS => {
            let fragment = headers_fragment(header, payload)?;
            let initial = header.stream_id > state.highest_stream_id;
            if initial {
                state.highest_stream_id = header.stream_id;
            }
            start_header_block(state, header, fragment, initial)
        },
        FRAME_TYPE_PUSH_PROMISE => {
            // Decoded only to keep the HPACK table in sync
            let fragment = push_promise_fragment(header, payload)?;
            start_header_block(state, header, fragment, false)
        },
        FRAME_TYPE_CONTINUATION => handle_continuation_frame(state, header, payload),
        _ => Ok(()),
    }
}

fn start_header_block(
    state: &mut H2DirectionState,
    header: &FrameHeader,
    fragment: &[u8],
    initial: bool,
) -> Result<(), ParseError> {
    if header.flags & FLAG_END_HEADERS != 0 {
        return decode_header_block(state, header.stream_id, fragment, initial);
    }

    state.pending_headers = Some(PendingHeaderBlock {
        stream_id: header.stream_id,
        fragment: fragment.to_vec(),
        initial,
    });
    Ok(())
}

fn handle_continuation_frame(
    state: &mut H2DirectionState,
    header: &FrameHeader,
    payload: &[u8],
) -> Result<(), ParseError> {
    let Some(mut pending) = state.pending_headers.take() else {
        return Err(ParseError::with_stream(
            ParseErrorKind::Http2UnexpectedContinuation,
            header.stream_id,
        ));
    };

    if pending.fragment.len() + payload.len() > state.limits.max_buffer_size {
        let stream_id = pending.stream_id;
        state.pending_headers = Some(pending);
        return Err(ParseError::with_stream(
            ParseErrorKind::Http2BufferTooLarge,
            stream_id,
        ));
    }

    if header.flags & FLAG_END_HEADERS == 0 {
        pending.fragment.extend_from_slice(payload);
        state.pending_headers = Some(pending);
        return Ok(());
    }

    let fragment_len = pending.fragment.len();
    pending.fragment.extend_from_slice(payload);
    let result = decode_header_block(state, pending.stream_id, &pending.fragment, pending.initial);
    if result.as_ref().is_err_and(ParseError::is_fatal) {
        // The sequence stays open, without the frame that failed
        pending.fragment.truncate(fragment_len);
        state.pending_headers = Some(pending);
    }
    result
}

/// Decode a complete header block with the direction's HPACK decoder.
///
/// On the client direction, the first header block of a new stream is run
/// through a [`RequestHeaderDriver`] and its request-line outcome is queued.
fn decode_header_block(
    state: &mut H2DirectionState,
    stream_id: StreamId,
    block: &[u8],
    initial: bool,
) -> Result<(), ParseError> {
    let mut driver = (initial && state.source == SourceId::Client).then(RequestHeaderDriver::new);

    let limits = &state.limits;
    let log = &mut state.infractions;
    let mut total_size: usize = 0;
    let mut header_count: usize = 0;
    let mut limit_exceeded = false;

    state
        .decoder
        .decode_with_cb(block, |name, value| {
            if limit_exceeded {
                return;
            }

            header_count += 1;
            // RFC 7540 §6.5.2: header list size = sum of (name.len + value.len + 32) per entry
            total_size += name.len() + value.len() + 32;
            if header_count > limits.max_header_count
                || value.len() > limits.max_header_value_size
                || total_size > limits.max_header_list_size
            {
                limit_exceeded = true;
                return;
            }

            if let Some(driver) = driver.as_mut() {
                driver.on_header(&name, &value, log);
            }
        })
        .map_err(|e| {
            ParseError::with_stream(ParseErrorKind::Http2HpackError(format!("{e:?}")), stream_id)
        })?;

    if limit_exceeded {
        return Err(ParseError::with_stream(
            ParseErrorKind::Http2HeaderListTooLarge,
            stream_id,
        ));
    }

    if let Some(driver) = driver {
        let outcome = driver.finish(&mut state.infractions);
        state.completed.push_back((stream_id, outcome));
    }

    Ok(())
}
