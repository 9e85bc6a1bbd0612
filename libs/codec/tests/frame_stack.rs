//! End-to-end frame stack compositions
//!
//! Exercises complete layer chains the way an application assembles them:
//! write a message through the composition, read it back, and check the
//! failure modes a transport actually produces (truncation, corruption,
//! desynchronization).

mod common;

use std::sync::Arc;

use common::{Ping, Pong, Versioned};
use wire_codec::{
    ChecksumAlgo, ChecksumLayer, DataLayer, FrameError, FrameStack, IdLayer, MsgRegistry,
    SizeLayer, SyncLayer, TransportValueLayer, WriteOutcome,
};
use wire_types::{field::Endian, GenericMessage, IoWriter, Message, SliceWriter};

fn registry() -> Arc<MsgRegistry> {
    Arc::new(
        MsgRegistry::builder()
            .register::<Ping>()
            .register::<Pong>()
            .build(),
    )
}

/// size(u16 BE) | id(u8) | payload | xor8 over id+payload
fn checked_stack() -> FrameStack<SizeLayer<ChecksumLayer<IdLayer<DataLayer>>>> {
    let registry = registry();
    FrameStack::with_registry(
        SizeLayer::new(
            2,
            Endian::Big,
            ChecksumLayer::suffix(
                ChecksumAlgo::Xor8,
                IdLayer::new(1, Endian::Big, Arc::clone(&registry), DataLayer),
            ),
        ),
        registry,
    )
}

/// size(u16 BE) | id(u8) | payload, no integrity check
fn plain_stack() -> FrameStack<SizeLayer<IdLayer<DataLayer>>> {
    let registry = registry();
    FrameStack::with_registry(
        SizeLayer::new(
            2,
            Endian::Big,
            IdLayer::new(1, Endian::Big, Arc::clone(&registry), DataLayer),
        ),
        registry,
    )
}

#[test]
fn ping_frame_wire_layout() {
    let stack = checked_stack();
    let mut out = Vec::new();
    let outcome = stack.write(&Ping, &mut out).unwrap();
    assert_eq!(outcome, WriteOutcome::Complete);
    // size=0x0002 covers id+checksum; xor over the lone id byte is itself
    assert_eq!(out, vec![0x00, 0x02, 0x01, 0x01]);

    let (msg, info) = stack.read(&out).unwrap();
    assert!(msg.downcast_ref::<Ping>().is_some());
    assert_eq!(info.msg_id, Some(0x01));
    assert_eq!(info.msg_idx, Some(0));
}

#[test]
fn truncated_ping_asks_for_exactly_one_byte() {
    let stack = checked_stack();
    let err = stack.read(&[0x00, 0x02, 0x01]).unwrap_err();
    assert_eq!(
        err,
        FrameError::NotEnoughData {
            missing: 1,
            available: 1
        }
    );
}

#[test]
fn tampered_checksum_byte_is_a_mismatch() {
    let stack = checked_stack();
    let err = stack.read(&[0x00, 0x02, 0x01, 0x02]).unwrap_err();
    assert_eq!(
        err,
        FrameError::ChecksumMismatch {
            expected: 0x02,
            calculated: 0x01,
            covered: 1
        }
    );
}

#[test]
fn pong_round_trip_carries_body() {
    let stack = checked_stack();
    let mut out = Vec::new();
    let _ = stack.write(&Pong { counter: 0xBEEF }, &mut out).unwrap();
    assert_eq!(out.len(), 6);

    let (msg, _) = stack.read(&out).unwrap();
    assert_eq!(msg.downcast_ref::<Pong>().unwrap().counter, 0xBEEF);
}

#[test]
fn missing_byte_estimates_are_sufficient() {
    let stack = checked_stack();
    let frame = [0x00u8, 0x02, 0x01, 0x01];

    // Grow the input by exactly what each failure asks for; the walk must
    // land on a successful read without overshooting the frame.
    let mut len = 0;
    loop {
        match stack.read(&frame[..len]) {
            Ok(_) => break,
            Err(FrameError::NotEnoughData { missing, .. }) => {
                len += missing;
                assert!(len <= frame.len(), "estimate overshot the frame");
            }
            Err(other) => panic!("unexpected error at prefix {len}: {other}"),
        }
    }
    assert_eq!(len, frame.len());
}

#[test]
fn undersized_declaration_is_malformed() {
    // size says 1 byte but the id layer alone needs 1 and xor8 needs 1 more
    let stack = checked_stack();
    let err = stack.read(&[0x00, 0x01, 0x01, 0x01]).unwrap_err();
    assert!(err.is_protocol_error(), "got {err}");
}

#[test]
fn corrupted_frame_is_rejected() {
    let stack = checked_stack();
    let mut frame = vec![0x00, 0x02, 0x01, 0x01];
    frame[2] ^= 0x04; // id byte
    let err = stack.read(&frame).unwrap_err();
    assert!(matches!(err, FrameError::ChecksumMismatch { .. }), "got {err}");
}

#[test]
fn length_accounting_matches_serialization() {
    let stack = checked_stack();
    let pong = Pong { counter: 7 };
    let mut out = Vec::new();
    let _ = stack.write(&pong, &mut out).unwrap();
    assert_eq!(stack.length(&pong), out.len());
    assert_eq!(stack.base_length(), out.len() - pong.counter.to_be_bytes().len());
}

#[test]
fn sequential_write_then_update_matches_single_pass() {
    let stack = checked_stack();
    let pong = Pong { counter: 0x1234 };

    let mut direct = Vec::new();
    let outcome = stack.write(&pong, &mut direct).unwrap();
    assert_eq!(outcome, WriteOutcome::Complete);

    let mut streamed = Vec::new();
    let outcome = {
        let mut out = IoWriter::new(&mut streamed);
        stack.write(&pong, &mut out).unwrap()
    };
    assert_eq!(outcome, WriteOutcome::UpdateRequired);
    assert_ne!(streamed, direct, "checksum placeholder still zero");

    stack.update(&mut streamed).unwrap();
    assert_eq!(streamed, direct);
}

#[test]
fn slice_writer_overflow_reports_shortfall() {
    let stack = checked_stack();
    let mut buf = [0u8; 3];
    let err = {
        let mut out = SliceWriter::new(&mut buf);
        stack.write(&Ping, &mut out).unwrap_err()
    };
    assert!(matches!(err, FrameError::BufferOverflow { .. }));
}

#[test]
fn split_read_defers_the_body() {
    let stack = plain_stack();
    let mut frame = Vec::new();
    let _ = stack.write(&Pong { counter: 0x0A0B }, &mut frame).unwrap();

    let (slot, info) = stack.read_until_data(&frame).unwrap();
    let mut slot = slot;
    let span = info.payload.unwrap();
    assert_eq!(span.offset, 3);
    assert_eq!(span.len, 2);
    // Body untouched so far
    assert_eq!(slot.as_ref().unwrap().downcast_ref::<Pong>().unwrap().counter, 0);

    stack
        .read_from_data(&mut slot, &frame[span.offset..span.offset + span.len])
        .unwrap();
    assert_eq!(slot.unwrap().downcast_ref::<Pong>().unwrap().counter, 0x0A0B);
}

#[test]
fn checksum_composition_refuses_split_read() {
    let stack = checked_stack();
    let mut frame = Vec::new();
    let _ = stack.write(&Ping, &mut frame).unwrap();
    let err = stack.read_until_data(&frame).unwrap_err();
    assert_eq!(err, FrameError::SplitUnsupported);
}

#[test]
fn sync_marker_guards_the_frame() {
    let registry = registry();
    let stack = FrameStack::with_registry(
        SyncLayer::new(
            0x5A,
            1,
            Endian::Big,
            SizeLayer::new(
                2,
                Endian::Big,
                IdLayer::new(1, Endian::Big, Arc::clone(&registry), DataLayer),
            ),
        ),
        registry,
    );

    let mut frame = Vec::new();
    let _ = stack.write(&Ping, &mut frame).unwrap();
    assert_eq!(frame[0], 0x5A);
    assert!(stack.read(&frame).is_ok());

    frame[0] = 0x5B;
    let err = stack.read(&frame).unwrap_err();
    assert_eq!(
        err,
        FrameError::SyncMismatch {
            expected: 0x5A,
            actual: 0x5B,
            offset: 0
        }
    );
}

#[test]
fn transport_value_reaches_the_body_read() {
    let registry = Arc::new(MsgRegistry::builder().register::<Versioned>().build());
    let stack = FrameStack::with_registry(
        SizeLayer::new(
            2,
            Endian::Big,
            IdLayer::new(
                1,
                Endian::Big,
                Arc::clone(&registry),
                TransportValueLayer::new(0, 1, Endian::Big, DataLayer),
            ),
        ),
        registry,
    );

    let original = Versioned {
        version: Some(3),
        body: 0x77,
    };
    let mut frame = Vec::new();
    let _ = stack.write(&original, &mut frame).unwrap();
    // size | id | version | body
    assert_eq!(frame, vec![0x00, 0x03, 0x30, 0x03, 0x77]);

    let (msg, _) = stack.read(&frame).unwrap();
    let back = msg.downcast_ref::<Versioned>().unwrap();
    assert_eq!(back.version, Some(3));
    assert_eq!(back.body, 0x77);
}

#[test]
fn unknown_id_is_captured_by_fallback() {
    let registry = Arc::new(
        MsgRegistry::builder()
            .register::<Ping>()
            .with_fallback()
            .build(),
    );
    let stack = FrameStack::with_registry(
        SizeLayer::new(
            2,
            Endian::Big,
            IdLayer::new(1, Endian::Big, Arc::clone(&registry), DataLayer),
        ),
        registry,
    );

    let frame = [0x00u8, 0x03, 0x7E, 0xAA, 0xBB];
    let (msg, info) = stack.read(&frame).unwrap();
    let generic = msg.downcast_ref::<GenericMessage>().unwrap();
    assert_eq!(generic.msg_id(), 0x7E);
    assert_eq!(generic.payload(), &[0xAA, 0xBB]);
    assert_eq!(info.msg_id, Some(0x7E));
}

#[test]
fn update_rewrites_size_and_checksum_together() {
    let stack = checked_stack();
    // Hand-built frame with zeroed size and checksum placeholders
    let mut frame = vec![0x00, 0x00, 0x02, 0x00, 0x2A, 0x00];
    stack.update(&mut frame).unwrap();
    assert_eq!(frame[..2], [0x00, 0x04]);
    assert_eq!(frame[5], 0x02 ^ 0x00 ^ 0x2A);

    let (msg, _) = stack.read(&frame).unwrap();
    assert_eq!(msg.downcast_ref::<Pong>().unwrap().counter, 0x002A);
}
