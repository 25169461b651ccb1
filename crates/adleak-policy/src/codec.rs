// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wire format for encoded windows
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────┬─────────────┐
//! │ Bitmask              │ Payload                          │ Zero pad    │
//! │ (bitmask_bytes)      │ ceil(retained × features × w / 8)│ (optional)  │
//! └──────────────────────┴──────────────────────────────────┴─────────────┘
//! ```
//!
//! Bit `i` of the bitmask (byte `i / 8`, MSB first) is set iff sample `i` was
//! retained. The payload is one MSB-first bit stream of two's complement
//! values, retained vectors in sequence order, `num_features` values each.
//!
//! `w` is the configured width unless group encoding had to lower it. The
//! decoder derives `w` from the bitmask popcount, so the message carries no
//! width header.

use adleak_fixed::FixedPoint;
use heapless::Vec;

use crate::config::PolicyConfig;
use crate::error::{PolicyError, Result};
use crate::window::CollectedWindow;

/// Sequential MSB-first bit writer over a zeroed buffer
struct BitWriter<'a> {
    buf: &'a mut [u8],
    bit: usize,
}

impl<'a> BitWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, bit: 0 }
    }

    /// Append the low `width` bits of `value`
    fn write(&mut self, value: u32, width: u8) {
        for shift in (0..width).rev() {
            if (value >> shift) & 1 == 1 {
                if let Some(byte) = self.buf.get_mut(self.bit / 8) {
                    *byte |= 0x80 >> (self.bit % 8);
                }
            }
            self.bit += 1;
        }
    }
}

/// Sequential MSB-first bit reader
struct BitReader<'a> {
    buf: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, bit: 0 }
    }

    /// Next `width` bits as an unsigned value, `None` past the end
    fn read(&mut self, width: u8) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..width {
            let byte = *self.buf.get(self.bit / 8)?;
            let bit = (byte >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit += 1;
        }
        Some(value)
    }
}

#[inline]
fn is_retained(bitmask: &[u8], index: usize) -> bool {
    bitmask
        .get(index / 8)
        .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
}

/// Clamp to the signed `width`-bit range, drop `shift` low bits, keep the
/// two's complement bit pattern of the result
#[inline]
fn pack_value(value: FixedPoint, width: u8, shift: u8) -> u32 {
    let high = (1i32 << (width - 1)) - 1;
    let low = -(1i32 << (width - 1));
    let clamped = i32::from(value.raw()).clamp(low, high) >> shift;
    let mask = (1u32 << (width - shift)) - 1;
    (clamped as u32) & mask
}

/// Sign-extend a `width`-bit pattern and restore the dropped `shift` bits
#[inline]
fn unpack_value(bits: u32, width: u8, shift: u8) -> FixedPoint {
    let unused = 32 - u32::from(width);
    let signed = ((bits << unused) as i32) >> unused;
    FixedPoint::saturating_from_i32(signed << shift)
}

/// Serialize `window` into `out`
///
/// Nothing is written unless the whole message fits.
pub(crate) fn encode_window<const SEQ: usize, const FEATURES: usize>(
    config: &PolicyConfig,
    window: &CollectedWindow<SEQ, FEATURES>,
    out: &mut [u8],
) -> Result<usize> {
    let retained = window.retained_count();
    let width = config
        .payload_width(retained)
        .ok_or(PolicyError::BudgetExceeded {
            required: config.payload_bytes(retained, config.width),
            available: config.target_data_bytes,
        })?;

    let payload_len = config.payload_bytes(retained, width);
    if payload_len > config.target_data_bytes {
        return Err(PolicyError::BudgetExceeded {
            required: payload_len,
            available: config.target_data_bytes,
        });
    }

    let message_len = config.bitmask_bytes + payload_len;
    if message_len > config.target_bytes {
        return Err(PolicyError::BudgetExceeded {
            required: message_len,
            available: config.target_bytes,
        });
    }

    let total = if config.pad_to_target {
        config.target_bytes
    } else {
        message_len
    };
    let available = out.len();
    let message = out.get_mut(..total).ok_or(PolicyError::BudgetExceeded {
        required: total,
        available,
    })?;
    message.fill(0);

    let (bitmask, payload) = message.split_at_mut(config.bitmask_bytes);
    for &index in window.indices() {
        if let Some(byte) = bitmask.get_mut(index / 8) {
            *byte |= 0x80 >> (index % 8);
        }
    }

    let shift = config.width - width;
    let mut writer = BitWriter::new(payload);
    for row in window.values() {
        for value in row {
            writer.write(pack_value(*value, config.width, shift), width);
        }
    }

    Ok(total)
}

/// A window recovered from its wire form
///
/// Values are at the configured precision. When group encoding lowered the
/// width, the dropped low bits come back as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWindow<const SEQ: usize, const FEATURES: usize> {
    indices: Vec<usize, SEQ>,
    values: Vec<[FixedPoint; FEATURES], SEQ>,
    width: u8,
}

impl<const SEQ: usize, const FEATURES: usize> DecodedWindow<SEQ, FEATURES> {
    /// Sequence indices of the retained samples, ascending
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[[FixedPoint; FEATURES]] {
        &self.values
    }

    /// Width the payload was packed at
    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[FixedPoint; FEATURES])> + '_ {
        self.indices.iter().copied().zip(self.values.iter())
    }
}

/// Parse an encoded window
///
/// Bytes after the payload (padding) are ignored.
///
/// # Errors
/// - [`PolicyError::InvalidConfiguration`] if `config` does not fit `SEQ`/`FEATURES`
/// - [`PolicyError::BudgetExceeded`] if `bytes` ends before the bitmask or
///   before the payload it announces, or the announced window cannot fit the
///   payload budget
///
/// # Example
/// ```
/// use adleak_fixed::FixedPoint;
/// use adleak_policy::{decode, AdaptiveLeakPolicy, PolicyConfig};
///
/// let config = PolicyConfig::default();
/// let mut policy: AdaptiveLeakPolicy<23, 10> = AdaptiveLeakPolicy::new(config).unwrap();
/// policy.collect(&[FixedPoint::from_raw(-7); 10]).unwrap();
///
/// let mut message = [0u8; 178];
/// let written = policy.encode(&mut message).unwrap();
///
/// let window = decode::<23, 10>(&config, &message[..written]).unwrap();
/// assert_eq!(window.indices(), &[0]);
/// assert_eq!(window.values()[0], [FixedPoint::from_raw(-7); 10]);
/// ```
pub fn decode<const SEQ: usize, const FEATURES: usize>(
    config: &PolicyConfig,
    bytes: &[u8],
) -> Result<DecodedWindow<SEQ, FEATURES>> {
    config.validate(SEQ, FEATURES)?;

    let truncated = |required: usize| PolicyError::BudgetExceeded {
        required,
        available: bytes.len(),
    };

    let bitmask = bytes
        .get(..config.bitmask_bytes)
        .ok_or_else(|| truncated(config.bitmask_bytes))?;

    let mut indices: Vec<usize, SEQ> = Vec::new();
    for index in (0..config.seq_length).filter(|i| is_retained(bitmask, *i)) {
        indices
            .push(index)
            .map_err(|_| PolicyError::WindowComplete { seq_length: SEQ })?;
    }

    let retained = indices.len();
    let width = config
        .payload_width(retained)
        .ok_or(PolicyError::BudgetExceeded {
            required: config.payload_bytes(retained, config.width),
            available: config.target_data_bytes,
        })?;

    let payload_end = config.bitmask_bytes + config.payload_bytes(retained, width);
    let payload = bytes
        .get(config.bitmask_bytes..payload_end)
        .ok_or_else(|| truncated(payload_end))?;

    let shift = config.width - width;
    let mut reader = BitReader::new(payload);
    let mut values: Vec<[FixedPoint; FEATURES], SEQ> = Vec::new();
    for _ in 0..retained {
        let mut row = [FixedPoint::ZERO; FEATURES];
        for value in row.iter_mut() {
            let bits = reader.read(width).ok_or_else(|| truncated(payload_end))?;
            *value = unpack_value(bits, width, shift);
        }
        values
            .push(row)
            .map_err(|_| PolicyError::WindowComplete { seq_length: SEQ })?;
    }

    Ok(DecodedWindow {
        indices,
        values,
        width,
    })
}
