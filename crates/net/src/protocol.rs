//! Wire protocol between the two peers of a match.
//!
//! Every message is one kind byte followed by that kind's fixed-size payload.
//! Multi-byte integers are big-endian.
//!
//! | Tag | Kind | Payload |
//! |-----|------|---------|
//! | 0 | Input | flags `u8`, score `u32` |
//! | 1 | Seed | authority seed `u32`, follower seed `u32` |
//! | 2 | GravityTick | none |
//! | 3 / 4 | RestartRequest / RestartResponse | none / accepted `u8` |
//! | 5 / 6 | PauseRequest / PauseResponse | none / accepted `u8` |
//! | 7 / 8 | ResumeRequest / ResumeResponse | none / accepted `u8` |
//! | 9 | Quit | none |
//! | 10 | NewGameAnnounce | none |
//!
//! [`decode`] checks the kind byte before it touches the payload, and rejects
//! anything that is not exactly one well-formed message.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::types::InputRecord;

/// Largest encoded message (Seed: tag + two u32).
pub const MAX_MESSAGE_LEN: usize = 9;

/// An encoded message. Stack-only.
pub type Frame = ArrayVec<u8, MAX_MESSAGE_LEN>;

const FLAG_LEFT: u8 = 1 << 0;
const FLAG_RIGHT: u8 = 1 << 1;
const FLAG_DOWN: u8 = 1 << 2;
const FLAG_ROTATE: u8 = 1 << 3;
const FLAG_RESET: u8 = 1 << 4;
const FLAG_MASK: u8 = FLAG_LEFT | FLAG_RIGHT | FLAG_DOWN | FLAG_ROTATE | FLAG_RESET;

/// Kind byte of each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Input = 0,
    Seed = 1,
    GravityTick = 2,
    RestartRequest = 3,
    RestartResponse = 4,
    PauseRequest = 5,
    PauseResponse = 6,
    ResumeRequest = 7,
    ResumeResponse = 8,
    Quit = 9,
    NewGameAnnounce = 10,
}

impl MessageKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => MessageKind::Input,
            1 => MessageKind::Seed,
            2 => MessageKind::GravityTick,
            3 => MessageKind::RestartRequest,
            4 => MessageKind::RestartResponse,
            5 => MessageKind::PauseRequest,
            6 => MessageKind::PauseResponse,
            7 => MessageKind::ResumeRequest,
            8 => MessageKind::ResumeResponse,
            9 => MessageKind::Quit,
            10 => MessageKind::NewGameAnnounce,
            _ => return None,
        })
    }

    /// Total encoded size including the kind byte.
    pub fn encoded_len(self) -> usize {
        match self {
            MessageKind::Input => 6,
            MessageKind::Seed => 9,
            MessageKind::RestartResponse
            | MessageKind::PauseResponse
            | MessageKind::ResumeResponse => 2,
            _ => 1,
        }
    }
}

/// Shared state transitions that need the peer's consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Restart,
    Pause,
    Resume,
}

impl RequestKind {
    pub const ALL: [RequestKind; 3] = [RequestKind::Restart, RequestKind::Pause, RequestKind::Resume];

    fn request_kind(self) -> MessageKind {
        match self {
            RequestKind::Restart => MessageKind::RestartRequest,
            RequestKind::Pause => MessageKind::PauseRequest,
            RequestKind::Resume => MessageKind::ResumeRequest,
        }
    }

    fn response_kind(self) -> MessageKind {
        match self {
            RequestKind::Restart => MessageKind::RestartResponse,
            RequestKind::Pause => MessageKind::PauseResponse,
            RequestKind::Resume => MessageKind::ResumeResponse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Restart => "restart",
            RequestKind::Pause => "pause",
            RequestKind::Resume => "resume",
        }
    }
}

/// Seeds for the two kernels of a match, as chosen by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeedPair {
    pub authority: u32,
    pub follower: u32,
}

impl SeedPair {
    /// Both players get the same piece sequence.
    pub fn shared(seed: u32) -> Self {
        Self {
            authority: seed,
            follower: seed,
        }
    }

    /// The follower's sequence is offset from the authority's.
    pub fn independent(seed: u32, offset: u32) -> Self {
        Self {
            authority: seed,
            follower: seed.wrapping_add(offset),
        }
    }
}

/// A decoded protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Input(InputRecord),
    Seed(SeedPair),
    GravityTick,
    Request(RequestKind),
    Response { kind: RequestKind, accepted: bool },
    Quit,
    NewGameAnnounce,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Input(_) => MessageKind::Input,
            Message::Seed(_) => MessageKind::Seed,
            Message::GravityTick => MessageKind::GravityTick,
            Message::Request(kind) => kind.request_kind(),
            Message::Response { kind, .. } => kind.response_kind(),
            Message::Quit => MessageKind::Quit,
            Message::NewGameAnnounce => MessageKind::NewGameAnnounce,
        }
    }
}

/// Reasons a byte sequence is not a valid message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty message")]
    Empty,
    #[error("unknown message kind {0}")]
    UnknownKind(u8),
    #[error("{kind:?} expects {expected} bytes, got {actual}")]
    Length {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },
    #[error("input flags {0:#04x} set undefined bits")]
    InvalidFlags(u8),
    #[error("accept byte must be 0 or 1, got {0}")]
    InvalidBool(u8),
}

fn input_flags(input: &InputRecord) -> u8 {
    let mut flags = 0;
    if input.move_left {
        flags |= FLAG_LEFT;
    }
    if input.move_right {
        flags |= FLAG_RIGHT;
    }
    if input.soft_drop {
        flags |= FLAG_DOWN;
    }
    if input.rotate {
        flags |= FLAG_ROTATE;
    }
    if input.reset {
        flags |= FLAG_RESET;
    }
    flags
}

/// Encode a message into a stack frame.
pub fn encode(message: &Message) -> Frame {
    let mut out = Frame::new();
    out.push(message.kind() as u8);
    match message {
        Message::Input(input) => {
            out.push(input_flags(input));
            out.extend(input.score.to_be_bytes());
        }
        Message::Seed(pair) => {
            out.extend(pair.authority.to_be_bytes());
            out.extend(pair.follower.to_be_bytes());
        }
        Message::Response { accepted, .. } => out.push(*accepted as u8),
        Message::GravityTick | Message::Request(_) | Message::Quit | Message::NewGameAnnounce => {}
    }
    out
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_bool(byte: u8) -> Result<bool, DecodeError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidBool(other)),
    }
}

/// Decode exactly one message.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    let (&tag, payload) = bytes.split_first().ok_or(DecodeError::Empty)?;
    let kind = MessageKind::from_tag(tag).ok_or(DecodeError::UnknownKind(tag))?;

    let expected = kind.encoded_len();
    if bytes.len() != expected {
        return Err(DecodeError::Length {
            kind,
            expected,
            actual: bytes.len(),
        });
    }

    let message = match kind {
        MessageKind::Input => {
            let flags = payload[0];
            if flags & !FLAG_MASK != 0 {
                return Err(DecodeError::InvalidFlags(flags));
            }
            Message::Input(InputRecord {
                move_left: flags & FLAG_LEFT != 0,
                move_right: flags & FLAG_RIGHT != 0,
                soft_drop: flags & FLAG_DOWN != 0,
                rotate: flags & FLAG_ROTATE != 0,
                reset: flags & FLAG_RESET != 0,
                score: read_u32(&payload[1..5]),
            })
        }
        MessageKind::Seed => Message::Seed(SeedPair {
            authority: read_u32(&payload[0..4]),
            follower: read_u32(&payload[4..8]),
        }),
        MessageKind::GravityTick => Message::GravityTick,
        MessageKind::RestartRequest => Message::Request(RequestKind::Restart),
        MessageKind::PauseRequest => Message::Request(RequestKind::Pause),
        MessageKind::ResumeRequest => Message::Request(RequestKind::Resume),
        MessageKind::RestartResponse => Message::Response {
            kind: RequestKind::Restart,
            accepted: read_bool(payload[0])?,
        },
        MessageKind::PauseResponse => Message::Response {
            kind: RequestKind::Pause,
            accepted: read_bool(payload[0])?,
        },
        MessageKind::ResumeResponse => Message::Response {
            kind: RequestKind::Resume,
            accepted: read_bool(payload[0])?,
        },
        MessageKind::Quit => Message::Quit,
        MessageKind::NewGameAnnounce => Message::NewGameAnnounce,
    };
    Ok(message)
}
