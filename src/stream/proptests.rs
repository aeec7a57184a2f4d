//! Property-based tests for stream reassembly
//!
//! The central property: however the body is split into chunks, the same
//! lines and the same events come out.

use super::framer::LineFramer;
use super::*;
use crate::runtime::testing::{chunked, sse_body};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Fragment text including multi-byte characters and JSON escapes
fn arb_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z0-9 .,!?]{1,16}",
        1 => "[àéîõüñ日本語🍄\"\\\\]{1,6}",
        1 => Just("\n".to_string()),
    ]
}

fn arb_fragments() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_fragment(), 0..12)
}

fn arb_cuts() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..4096, 0..24)
}

// ============================================================================
// Helpers
// ============================================================================

/// Frame and decode a chunk sequence, including the end-of-stream flush
fn reassemble(chunks: &[Vec<u8>]) -> (Vec<String>, Vec<StreamEvent>) {
    let mut framer = LineFramer::new();
    let decoder = EventDecoder::default();

    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(framer.push(chunk).expect("valid utf-8 body"));
    }
    lines.extend(framer.finish().expect("valid utf-8 tail"));

    let events = lines.iter().filter_map(|l| decoder.decode(l)).collect();
    (lines, events)
}

fn content_of(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ContentFragment(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Chunk boundaries never change the lines that come out
    #[test]
    fn prop_framing_is_split_invariant(fragments in arb_fragments(), cuts in arb_cuts()) {
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        let body = sse_body(&refs);

        let (whole_lines, whole_events) = reassemble(&[body.clone().into_bytes()]);
        let (split_lines, split_events) = reassemble(&chunked(body.as_bytes(), &cuts));

        prop_assert_eq!(whole_lines, split_lines);
        prop_assert_eq!(whole_events, split_events);
    }

    // Concatenated fragments reproduce the sent reply exactly
    #[test]
    fn prop_reassembled_content_matches(fragments in arb_fragments(), cuts in arb_cuts()) {
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        let body = sse_body(&refs);

        let (_, events) = reassemble(&chunked(body.as_bytes(), &cuts));

        prop_assert_eq!(content_of(&events), fragments.concat());
        prop_assert_eq!(events.last(), Some(&StreamEvent::Terminator));
        let terminators = events.iter().filter(|e| **e == StreamEvent::Terminator).count();
        prop_assert_eq!(terminators, 1);
    }

    // One byte per chunk is the worst case for the buffer
    #[test]
    fn prop_byte_at_a_time(fragments in arb_fragments()) {
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        let body = sse_body(&refs);
        let chunks: Vec<Vec<u8>> = body.as_bytes().iter().map(|b| vec![*b]).collect();

        let (_, events) = reassemble(&chunks);
        prop_assert_eq!(content_of(&events), fragments.concat());
    }

    // The framer never holds a newline and never loses a byte
    #[test]
    fn prop_framer_buffers_only_the_tail(data in "[a-z\n]{0,200}", cuts in arb_cuts()) {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunked(data.as_bytes(), &cuts) {
            lines.extend(framer.push(&chunk).unwrap());
        }

        let tail = data.rsplit('\n').next().unwrap_or_default();
        prop_assert_eq!(framer.buffered_len(), tail.len());
        prop_assert_eq!(lines.len(), data.matches('\n').count());
    }

    // Decoding is total: arbitrary lines never panic
    #[test]
    fn prop_decoder_never_panics(line in ".{0,200}") {
        let decoder = EventDecoder::default();
        let _ = decoder.decode(&line);
        let _ = decoder.decode(&format!("data: {line}"));
    }

    // Non-JSON payloads are always reported, never dropped
    #[test]
    fn prop_garbage_payload_is_malformed(payload in "[a-z][a-z ]{0,30}") {
        prop_assume!(payload.trim() != "[DONE]");
        let decoder = EventDecoder::default();
        let event = decoder.decode(&format!("data: {payload}"));
        let is_malformed = matches!(event, Some(StreamEvent::MalformedLine { .. }));
        prop_assert!(is_malformed);
    }

    // The terminator survives any split of its own bytes
    #[test]
    fn prop_split_terminator(cut in 0usize..14) {
        let body = b"data: [DONE]\n\n";
        let (_, events) = reassemble(&chunked(body, &[cut]));
        prop_assert_eq!(events, vec![StreamEvent::Terminator]);
    }
}
