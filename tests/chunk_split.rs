//! Reassembly must not depend on how the byte stream was chunked.

use bytes::Bytes;
use lpframe::{Demultiplexer, FrameError, encode};
use proptest::prelude::*;

// Small payloads keep the cases fast; size limits are covered by unit tests.
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

fn payloads_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 1..8)
}

prop_compose! {
    /// A wire stream for several payloads plus chunk sizes to cut it with.
    fn chunked_stream()(payloads in payloads_strategy(), sizes in prop::collection::vec(1usize..64, 1..32))
        -> (Vec<Vec<u8>>, Vec<usize>) {
        (payloads, sizes)
    }
}

fn wire(payloads: &[Vec<u8>]) -> Vec<u8> {
    payloads
        .iter()
        .flat_map(|p| encode(p).unwrap().to_vec())
        .collect()
}

fn expected(payloads: &[Vec<u8>]) -> Vec<Bytes> {
    payloads.iter().map(|p| Bytes::copy_from_slice(p)).collect()
}

/// Feeds `data` cut into chunks whose sizes cycle through `sizes`.
fn feed_in_chunks(data: &[u8], sizes: &[usize]) -> Vec<Bytes> {
    let mut demux = Demultiplexer::new();
    let mut out = Vec::new();
    let mut offset = 0;
    for size in sizes.iter().cycle() {
        if offset >= data.len() {
            break;
        }
        let end = (offset + size).min(data.len());
        out.extend(demux.feed(&data[offset..end]).unwrap());
        assert!(
            demux
                .pending_frame_len()
                .is_none_or(|len| demux.buffered_len() < len as usize + 4),
            "complete frame left in buffer"
        );
        offset = end;
    }
    demux.finish().unwrap();
    out
}

proptest! {
    #[test]
    fn prop_round_trip(payload in payload_strategy()) {
        let mut demux = Demultiplexer::new();
        let out = demux.feed(&encode(&payload).unwrap()).unwrap();
        prop_assert_eq!(out, vec![Bytes::from(payload)]);
        prop_assert!(demux.is_empty());
    }

    #[test]
    fn prop_coalesced_into_one_chunk(payloads in payloads_strategy()) {
        let mut demux = Demultiplexer::new();
        prop_assert_eq!(demux.feed(&wire(&payloads)).unwrap(), expected(&payloads));
        prop_assert!(demux.finish().is_ok());
    }

    #[test]
    fn prop_chunk_split_invariance((payloads, sizes) in chunked_stream()) {
        let data = wire(&payloads);
        prop_assert_eq!(feed_in_chunks(&data, &sizes), expected(&payloads));
    }

    #[test]
    fn prop_random_cut_points(
        payloads in payloads_strategy(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
    ) {
        let data = wire(&payloads);
        let mut points: Vec<usize> = cuts.iter().map(|c| c.index(data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();
        points.dedup();

        let mut demux = Demultiplexer::new();
        let mut out = Vec::new();
        for pair in points.windows(2) {
            out.extend(demux.feed(&data[pair[0]..pair[1]]).unwrap());
            let buffered = demux.buffered_len();
            prop_assert!(demux.feed(&[]).unwrap().is_empty());
            prop_assert_eq!(demux.buffered_len(), buffered);
        }
        prop_assert_eq!(out, expected(&payloads));
        prop_assert!(demux.finish().is_ok());
    }

    #[test]
    fn prop_truncated_stream_detected(payload in payload_strategy(), cut in any::<prop::sample::Index>()) {
        let data = encode(&payload).unwrap();
        let at = 1 + cut.index(data.len() - 1);
        let mut demux = Demultiplexer::new();
        prop_assert!(demux.feed(&data[..at]).unwrap().is_empty());
        let truncated = matches!(demux.finish(), Err(FrameError::TruncatedStream { buffered }) if buffered == at);
        prop_assert!(truncated);
    }
}

#[test]
fn every_two_way_split_of_one_frame() {
    let payload = b"split me anywhere";
    let data = encode(payload).unwrap();
    for cut in 1..data.len() {
        let mut demux = Demultiplexer::new();
        assert!(demux.feed(&data[..cut]).unwrap().is_empty(), "cut at {cut}");
        assert_eq!(
            demux.feed(&data[cut..]).unwrap(),
            vec![Bytes::from_static(payload)],
            "cut at {cut}"
        );
    }
}

#[test]
fn every_three_way_split_of_one_frame() {
    let payload = b"split";
    let data = encode(payload).unwrap();
    for a in 1..data.len() {
        for b in a + 1..data.len() {
            let mut demux = Demultiplexer::new();
            let mut out = demux.feed(&data[..a]).unwrap();
            out.extend(demux.feed(&data[a..b]).unwrap());
            out.extend(demux.feed(&data[b..]).unwrap());
            assert_eq!(out, vec![Bytes::from_static(payload)], "cuts at {a}, {b}");
        }
    }
}

#[test]
fn example_split_header() {
    let mut demux = Demultiplexer::new();
    assert!(demux.feed(&[0x00, 0x00]).unwrap().is_empty());
    assert_eq!(
        demux.feed(&[0x00, 0x01, 0x41]).unwrap(),
        vec![Bytes::from_static(b"A")]
    );
}

#[test]
fn truncation_after_partial_header() {
    let mut demux = Demultiplexer::new();
    demux.feed(&[0x00, 0x00]).unwrap();
    assert!(matches!(
        demux.finish(),
        Err(FrameError::TruncatedStream { buffered: 2 })
    ));
}
