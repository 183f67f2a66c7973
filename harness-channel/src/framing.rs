//! Packet framing for the automation channel.
//!
//! Commands are CBOR payloads broken into fixed 64-byte frames, the framing
//! CTAP devices use on the wire: an initialization frame carrying a channel
//! id, a command byte with its high bit set and a big-endian payload
//! length, followed by continuation frames carrying a sequence byte.

use std::collections::HashMap;

/// Every frame on the channel is exactly this long; short payloads are
/// zero padded.
pub(crate) const FRAME_SIZE: usize = 64;

/// Distinguishes initialization frames from continuations: set on the
/// command byte, never on a sequence byte.
const MARKER_BIT: u8 = 1 << 7;

const INIT_HEADER: usize = 7;
const CONT_HEADER: usize = 5;
const INIT_PAYLOAD: usize = FRAME_SIZE - INIT_HEADER;
const CONT_PAYLOAD: usize = FRAME_SIZE - CONT_HEADER;

/// The command byte of an initialization frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameCommand {
    /// The payload is a CBOR-encoded channel request or response.
    Cbor,
    /// The payload is a UTF-8 error message.
    Error,
}

impl FrameCommand {
    const fn byte(self) -> u8 {
        match self {
            Self::Cbor => 0x10,
            Self::Error => 0x3F,
        }
    }

    fn encode(self) -> u8 {
        MARKER_BIT | self.byte()
    }
}

impl TryFrom<u8> for FrameCommand {
    type Error = FramingError;

    fn try_from(value: u8) -> Result<Self, FramingError> {
        match value {
            0x10 => Ok(Self::Cbor),
            0x3F => Ok(Self::Error),
            other => Err(FramingError::UnknownCommand(other)),
        }
    }
}

/// Errors of the framing layer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FramingError {
    /// The payload cannot be described by the length field.
    #[error("payload of {0} bytes exceeds what a channel message can carry")]
    PayloadTooBig(usize),
    /// The command byte of an initialization frame is not recognized.
    #[error("unknown channel command byte 0x{0:02x}")]
    UnknownCommand(u8),
    /// A continuation frame arrived with the wrong sequence number.
    #[error("continuation frame out of sequence")]
    OutOfSequence,
    /// A frame was shorter than the fixed frame size.
    #[error("frame shorter than {FRAME_SIZE} bytes")]
    ShortFrame,
}

/// A complete message, reassembled from one or more frames.
#[derive(Debug)]
pub(crate) struct Message {
    /// The logical channel this message belongs to.
    pub channel: u32,
    /// What the payload contains.
    pub command: FrameCommand,
    /// The reassembled payload.
    pub payload: Vec<u8>,
    /// Total payload length announced by the initialization frame.
    expected_len: usize,
    /// Next expected continuation sequence number.
    sequence: u8,
}

impl Message {
    /// Create a message to send.
    pub fn new(channel: u32, command: FrameCommand, payload: &[u8]) -> Result<Self, FramingError> {
        if payload.len() > usize::from(u16::MAX) {
            return Err(FramingError::PayloadTooBig(payload.len()));
        }
        let continuations = payload.len().saturating_sub(INIT_PAYLOAD).div_ceil(CONT_PAYLOAD);
        if continuations > usize::from(MARKER_BIT) {
            return Err(FramingError::PayloadTooBig(payload.len()));
        }
        Ok(Self {
            channel,
            command,
            payload: payload.to_vec(),
            expected_len: payload.len(),
            sequence: 0,
        })
    }

    /// Break the message into wire frames.
    pub fn to_frames(&self) -> Vec<[u8; FRAME_SIZE]> {
        let mut frames = Vec::with_capacity(1 + self.payload.len() / CONT_PAYLOAD);

        let mut init = [0u8; FRAME_SIZE];
        init[..4].copy_from_slice(&self.channel.to_be_bytes());
        init[4] = self.command.encode();
        // SAFETY: the constructor rejected payloads longer than a u16.
        init[5..7].copy_from_slice(&u16::try_from(self.payload.len()).unwrap().to_be_bytes());
        let first = self.payload.len().min(INIT_PAYLOAD);
        init[INIT_HEADER..INIT_HEADER + first].copy_from_slice(&self.payload[..first]);
        frames.push(init);

        for (seq, chunk) in self.payload[first..].chunks(CONT_PAYLOAD).enumerate() {
            let mut frame = [0u8; FRAME_SIZE];
            frame[..4].copy_from_slice(&self.channel.to_be_bytes());
            // SAFETY: the constructor bounds the number of continuations.
            frame[4] = u8::try_from(seq).unwrap();
            frame[CONT_HEADER..CONT_HEADER + chunk.len()].copy_from_slice(chunk);
            frames.push(frame);
        }

        frames
    }

    fn is_complete(&self) -> bool {
        self.payload.len() >= self.expected_len
    }

    fn extend(&mut self, seq: u8, data: &[u8]) -> Result<(), FramingError> {
        if seq != self.sequence {
            return Err(FramingError::OutOfSequence);
        }
        self.sequence += 1;
        let remaining = self.expected_len - self.payload.len();
        self.payload.extend_from_slice(&data[..remaining.min(data.len())]);
        Ok(())
    }
}

/// Reassembles frames into messages, per logical channel.
#[derive(Debug, Default)]
pub(crate) struct Reassembler {
    pending: HashMap<u32, Message>,
}

impl Reassembler {
    /// Feed one wire frame; returns the message once it is complete.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Option<Message>, FramingError> {
        if frame.len() < FRAME_SIZE {
            return Err(FramingError::ShortFrame);
        }
        // SAFETY: length checked above.
        let channel = u32::from_be_bytes(frame[..4].try_into().unwrap());
        let marker = frame[4];

        if marker & MARKER_BIT == MARKER_BIT {
            let command = FrameCommand::try_from(marker & !MARKER_BIT)?;
            // SAFETY: length checked above.
            let expected_len = usize::from(u16::from_be_bytes(frame[5..7].try_into().unwrap()));
            let first = expected_len.min(INIT_PAYLOAD);
            let message = Message {
                channel,
                command,
                payload: frame[INIT_HEADER..INIT_HEADER + first].to_vec(),
                expected_len,
                sequence: 0,
            };
            if message.is_complete() {
                return Ok(Some(message));
            }
            // A reused channel id drops any unfinished message.
            self.pending.insert(channel, message);
            Ok(None)
        } else {
            let Some(message) = self.pending.get_mut(&channel) else {
                // Continuation for a message we never saw the start of.
                return Ok(None);
            };
            message.extend(marker, &frame[CONT_HEADER..])?;
            if message.is_complete() {
                Ok(self.pending.remove(&channel))
            } else {
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame_round_trip() {
        let message = Message::new(7, FrameCommand::Cbor, b"hello").expect("small payload");
        let frames = message.to_frames();
        assert_eq!(frames.len(), 1);

        let mut reassembler = Reassembler::default();
        let out = reassembler
            .handle_frame(&frames[0])
            .expect("valid frame")
            .expect("complete in one frame");
        assert_eq!(out.channel, 7);
        assert_eq!(out.command, FrameCommand::Cbor);
        assert_eq!(out.payload, b"hello");
    }

    #[test]
    fn multi_frame_round_trip() {
        let payload: Vec<u8> = (0..=255).collect::<Vec<u8>>().repeat(3);
        let message = Message::new(1, FrameCommand::Cbor, &payload).expect("payload fits");
        let frames = message.to_frames();
        assert!(frames.len() > 1);

        let mut reassembler = Reassembler::default();
        let mut result = None;
        for frame in &frames {
            result = reassembler.handle_frame(frame).expect("valid frame");
        }
        let out = result.expect("complete after the last frame");
        assert_eq!(out.payload, payload);
    }

    #[test]
    fn out_of_sequence_is_an_error() {
        let payload = vec![0xAB; 200];
        let frames = Message::new(1, FrameCommand::Cbor, &payload)
            .expect("payload fits")
            .to_frames();
        assert!(frames.len() >= 3);

        let mut reassembler = Reassembler::default();
        assert!(reassembler.handle_frame(&frames[0]).expect("init ok").is_none());
        // Skip frames[1]: its sequence number no longer matches.
        assert!(matches!(
            reassembler.handle_frame(&frames[2]),
            Err(FramingError::OutOfSequence)
        ));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let too_big = vec![0; usize::from(u16::MAX) + 1];
        assert!(matches!(
            Message::new(1, FrameCommand::Cbor, &too_big),
            Err(FramingError::PayloadTooBig(_))
        ));
    }
}
