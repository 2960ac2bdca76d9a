//! Binary input tapes.
//!
//! Layout (little-endian):
//!
//! ```text
//! header  magic "ARNT" u32 | version u8 | reserved [u8; 3] | seed u32 | frame_count u32
//! frame   event_count u16 | events...
//! event   0x01 connect    owner u32
//!         0x02 disconnect owner u32
//!         0x03 control    owner u32 | x i32 | y i32 | flags u8
//! footer  final_digest u64 | crc32 u32
//! ```
//!
//! Control flags: bit 0 = target present, bit 1 = boost held. The remaining
//! bits are reserved and must be zero. The CRC covers every byte before it.

use alloc::vec::Vec;

use crate::error::TapeError;
use crate::fixed_point::IVec2;
use crate::types::{ControlInput, FrameInput, OwnerId};

pub const TAPE_MAGIC: u32 = u32::from_le_bytes(*b"ARNT");
pub const TAPE_VERSION: u8 = 1;
pub const TAPE_HEADER_SIZE: usize = 16;
pub const TAPE_FOOTER_SIZE: usize = 12;

/// Default replay ceiling: one hour at 60 frames per second.
pub const MAX_FRAMES_DEFAULT: u32 = 216_000;

const EVENT_CONNECT: u8 = 0x01;
const EVENT_DISCONNECT: u8 = 0x02;
const EVENT_CONTROL: u8 = 0x03;

const FLAG_TARGET: u8 = 0x01;
const FLAG_BOOST: u8 = 0x02;
const FLAG_RESERVED: u8 = !(FLAG_TARGET | FLAG_BOOST);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TapeHeader {
    pub magic: u32,
    pub version: u8,
    pub seed: u32,
    pub frame_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TapeFooter {
    pub final_digest: u64,
    pub checksum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tape {
    pub header: TapeHeader,
    pub frames: Vec<FrameInput>,
    pub footer: TapeFooter,
}

pub fn encode_control_flags(input: &ControlInput) -> u8 {
    let mut flags = 0;
    if input.target.is_some() {
        flags |= FLAG_TARGET;
    }
    if input.boost {
        flags |= FLAG_BOOST;
    }
    flags
}

pub fn serialize_tape(
    seed: u32,
    frames: &[FrameInput],
    final_digest: u64,
) -> Result<Vec<u8>, TapeError> {
    let mut bytes = Vec::with_capacity(TAPE_HEADER_SIZE + frames.len() * 2 + TAPE_FOOTER_SIZE);

    bytes.extend_from_slice(&TAPE_MAGIC.to_le_bytes());
    bytes.push(TAPE_VERSION);
    bytes.extend_from_slice(&[0, 0, 0]);
    bytes.extend_from_slice(&seed.to_le_bytes());
    bytes.extend_from_slice(&(frames.len() as u32).to_le_bytes());

    for (index, frame) in frames.iter().enumerate() {
        let count = frame.event_count();
        let count_u16 = u16::try_from(count).map_err(|_| TapeError::TooManyEvents {
            frame: index as u32,
            count,
        })?;
        bytes.extend_from_slice(&count_u16.to_le_bytes());

        for owner in &frame.connects {
            bytes.push(EVENT_CONNECT);
            bytes.extend_from_slice(&owner.0.to_le_bytes());
        }
        for owner in &frame.disconnects {
            bytes.push(EVENT_DISCONNECT);
            bytes.extend_from_slice(&owner.0.to_le_bytes());
        }
        for (owner, control) in &frame.controls {
            let target = control.target.unwrap_or(IVec2::ZERO);
            bytes.push(EVENT_CONTROL);
            bytes.extend_from_slice(&owner.0.to_le_bytes());
            bytes.extend_from_slice(&target.x.to_le_bytes());
            bytes.extend_from_slice(&target.y.to_le_bytes());
            bytes.push(encode_control_flags(control));
        }
    }

    bytes.extend_from_slice(&final_digest.to_le_bytes());
    let checksum = crc32(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    Ok(bytes)
}

pub fn parse_tape(bytes: &[u8], max_frames: u32) -> Result<Tape, TapeError> {
    let min_len = TAPE_HEADER_SIZE + TAPE_FOOTER_SIZE;
    if bytes.len() < min_len {
        return Err(TapeError::TooShort {
            actual: bytes.len(),
            min: min_len,
        });
    }

    let magic = read_u32_le(bytes, 0);
    if magic != TAPE_MAGIC {
        return Err(TapeError::InvalidMagic { found: magic });
    }

    let version = bytes[4];
    if version != TAPE_VERSION {
        return Err(TapeError::UnsupportedVersion { found: version });
    }
    if bytes[5..8] != [0, 0, 0] {
        return Err(TapeError::HeaderReservedNonZero);
    }

    let seed = read_u32_le(bytes, 8);
    let frame_count = read_u32_le(bytes, 12);
    if frame_count > max_frames {
        return Err(TapeError::FrameCountOutOfRange {
            frame_count,
            max_frames,
        });
    }

    let body_end = bytes.len() - TAPE_FOOTER_SIZE;
    let mut reader = Reader {
        bytes: &bytes[..body_end],
        pos: TAPE_HEADER_SIZE,
    };
    let mut frames = Vec::with_capacity(frame_count as usize);
    for frame in 0..frame_count {
        frames.push(read_frame(&mut reader, frame)?);
    }
    if reader.pos != body_end {
        return Err(TapeError::TrailingData {
            expected: reader.pos + TAPE_FOOTER_SIZE,
            actual: bytes.len(),
        });
    }

    let final_digest = read_u64_le(bytes, body_end);
    let checksum = read_u32_le(bytes, body_end + 8);
    let computed = crc32(&bytes[..body_end + 8]);
    if checksum != computed {
        return Err(TapeError::CrcMismatch {
            stored: checksum,
            computed,
        });
    }

    Ok(Tape {
        header: TapeHeader {
            magic,
            version,
            seed,
            frame_count,
        },
        frames,
        footer: TapeFooter {
            final_digest,
            checksum,
        },
    })
}

fn read_frame(reader: &mut Reader<'_>, frame: u32) -> Result<FrameInput, TapeError> {
    let truncated = TapeError::Truncated { frame };
    let count = reader.u16().ok_or(truncated.clone())?;

    let mut input = FrameInput::default();
    for _ in 0..count {
        let tag = reader.u8().ok_or(truncated.clone())?;
        let owner = OwnerId(reader.u32().ok_or(truncated.clone())?);
        match tag {
            EVENT_CONNECT => input.connects.push(owner),
            EVENT_DISCONNECT => input.disconnects.push(owner),
            EVENT_CONTROL => {
                let x = reader.i32().ok_or(truncated.clone())?;
                let y = reader.i32().ok_or(truncated.clone())?;
                let flags = reader.u8().ok_or(truncated.clone())?;
                if flags & FLAG_RESERVED != 0 {
                    return Err(TapeError::ReservedControlBits { frame, flags });
                }
                let control = ControlInput {
                    target: (flags & FLAG_TARGET != 0).then_some(IVec2::new(x, y)),
                    boost: flags & FLAG_BOOST != 0,
                };
                input.controls.insert(owner, control);
            }
            _ => return Err(TapeError::UnknownEvent { frame, tag }),
        }
    }
    Ok(input)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let chunk: [u8; N] = self.bytes.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(chunk)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u64_le(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;

        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }

        table[i] = c;
        i += 1;
    }

    table
}

/// CRC-32/IEEE.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;

    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }

    crc ^ 0xFFFF_FFFFu32
}
