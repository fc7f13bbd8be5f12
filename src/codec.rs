//! Texel encoding and decoding for every [`PixelFormat`].
//!
//! Texels are little endian and tightly packed. sRGB formats store the already
//! encoded value: conversion from linear happens in the reference renderer,
//! exactly where the GPU would apply it on store.

use crate::format::{ChannelEncoding, PixelFormat};
use half::f16;

/// A single texel, widened to 32 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pixel {
    Float([f32; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
}

impl Pixel {
    pub fn as_float(&self) -> [f32; 4] {
        match *self {
            Pixel::Float(v) => v,
            Pixel::Int(v) => v.map(|c| c as f32),
            Pixel::Uint(v) => v.map(|c| c as f32),
        }
    }

    pub fn as_int(&self) -> [i32; 4] {
        match *self {
            Pixel::Float(v) => v.map(|c| c as i32),
            Pixel::Int(v) => v,
            Pixel::Uint(v) => v.map(|c| c as i32),
        }
    }

    pub fn as_uint(&self) -> [u32; 4] {
        match *self {
            Pixel::Float(v) => v.map(|c| c as u32),
            Pixel::Int(v) => v.map(|c| c as u32),
            Pixel::Uint(v) => v,
        }
    }

    /// Zero texel with the variant the format stores.
    pub fn zero(format: PixelFormat) -> Pixel {
        decode_pixel(format, &[0u8; MAX_BYTES_PER_PIXEL])
    }
}

pub const MAX_BYTES_PER_PIXEL: usize = 16;

pub fn bytes_per_pixel(format: PixelFormat) -> usize {
    let channels = format.channel_count();
    match format.encoding() {
        ChannelEncoding::Float32 | ChannelEncoding::Sint32 | ChannelEncoding::Uint32 => {
            4 * channels
        }
        ChannelEncoding::Float16 | ChannelEncoding::Sint16 | ChannelEncoding::Uint16 => {
            2 * channels
        }
        ChannelEncoding::Unorm8 | ChannelEncoding::Sint8 | ChannelEncoding::Uint8 => channels,
        ChannelEncoding::UfloatR11G11B10
        | ChannelEncoding::UnormR10G10B10A2
        | ChannelEncoding::UintR10G10B10A2 => 4,
    }
}

/// Decodes one texel. Channels the format lacks read back as `(0, 0, 0, 1)`.
pub fn decode_pixel(format: PixelFormat, bytes: &[u8]) -> Pixel {
    let channels = format.channel_count();
    match format.encoding() {
        ChannelEncoding::Float32 => {
            let mut out = [0.0, 0.0, 0.0, 1.0];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = f32::from_le_bytes(read4(bytes, i * 4));
            }
            Pixel::Float(out)
        }
        ChannelEncoding::Float16 => {
            let mut out = [0.0, 0.0, 0.0, 1.0];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = f16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]).to_f32();
            }
            Pixel::Float(out)
        }
        ChannelEncoding::UfloatR11G11B10 => {
            let word = u32::from_le_bytes(read4(bytes, 0));
            Pixel::Float([
                decode_small_float(word & 0x7ff, 6),
                decode_small_float((word >> 11) & 0x7ff, 6),
                decode_small_float((word >> 22) & 0x3ff, 5),
                1.0,
            ])
        }
        ChannelEncoding::Unorm8 => {
            let mut out = [0.0, 0.0, 0.0, 1.0];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = bytes[i] as f32 / 255.0;
            }
            Pixel::Float(out)
        }
        ChannelEncoding::UnormR10G10B10A2 => {
            let word = u32::from_le_bytes(read4(bytes, 0));
            Pixel::Float([
                (word & 0x3ff) as f32 / 1023.0,
                ((word >> 10) & 0x3ff) as f32 / 1023.0,
                ((word >> 20) & 0x3ff) as f32 / 1023.0,
                (word >> 30) as f32 / 3.0,
            ])
        }
        ChannelEncoding::Sint8 => {
            let mut out = [0, 0, 0, 1];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = bytes[i] as i8 as i32;
            }
            Pixel::Int(out)
        }
        ChannelEncoding::Sint16 => {
            let mut out = [0, 0, 0, 1];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = i16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]) as i32;
            }
            Pixel::Int(out)
        }
        ChannelEncoding::Sint32 => {
            let mut out = [0, 0, 0, 1];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = i32::from_le_bytes(read4(bytes, i * 4));
            }
            Pixel::Int(out)
        }
        ChannelEncoding::Uint8 => {
            let mut out = [0, 0, 0, 1];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = bytes[i] as u32;
            }
            Pixel::Uint(out)
        }
        ChannelEncoding::Uint16 => {
            let mut out = [0, 0, 0, 1];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]) as u32;
            }
            Pixel::Uint(out)
        }
        ChannelEncoding::Uint32 => {
            let mut out = [0, 0, 0, 1];
            for (i, value) in out.iter_mut().enumerate().take(channels) {
                *value = u32::from_le_bytes(read4(bytes, i * 4));
            }
            Pixel::Uint(out)
        }
        ChannelEncoding::UintR10G10B10A2 => {
            let word = u32::from_le_bytes(read4(bytes, 0));
            Pixel::Uint([
                word & 0x3ff,
                (word >> 10) & 0x3ff,
                (word >> 20) & 0x3ff,
                word >> 30,
            ])
        }
    }
}

/// Encodes one texel into `out`, which must hold at least
/// [`bytes_per_pixel`] bytes. Out-of-range values saturate.
pub fn encode_pixel(format: PixelFormat, pixel: Pixel, out: &mut [u8]) {
    let channels = format.channel_count();
    match format.encoding() {
        ChannelEncoding::Float32 => {
            let values = pixel.as_float();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
        ChannelEncoding::Float16 => {
            let values = pixel.as_float();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i * 2..i * 2 + 2].copy_from_slice(&f16::from_f32(*value).to_le_bytes());
            }
        }
        ChannelEncoding::UfloatR11G11B10 => {
            let [r, g, b, _] = pixel.as_float();
            let word = encode_small_float(r, 6)
                | (encode_small_float(g, 6) << 11)
                | (encode_small_float(b, 5) << 22);
            out[..4].copy_from_slice(&word.to_le_bytes());
        }
        ChannelEncoding::Unorm8 => {
            let values = pixel.as_float();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i] = encode_unorm(*value, 8) as u8;
            }
        }
        ChannelEncoding::UnormR10G10B10A2 => {
            let [r, g, b, a] = pixel.as_float();
            let word = encode_unorm(r, 10)
                | (encode_unorm(g, 10) << 10)
                | (encode_unorm(b, 10) << 20)
                | (encode_unorm(a, 2) << 30);
            out[..4].copy_from_slice(&word.to_le_bytes());
        }
        ChannelEncoding::Sint8 => {
            let values = pixel.as_int();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i] = (*value).clamp(i8::MIN as i32, i8::MAX as i32) as i8 as u8;
            }
        }
        ChannelEncoding::Sint16 => {
            let values = pixel.as_int();
            for (i, value) in values.iter().enumerate().take(channels) {
                let value = (*value).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
                out[i * 2..i * 2 + 2].copy_from_slice(&value.to_le_bytes());
            }
        }
        ChannelEncoding::Sint32 => {
            let values = pixel.as_int();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
        ChannelEncoding::Uint8 => {
            let values = pixel.as_uint();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i] = (*value).min(u8::MAX as u32) as u8;
            }
        }
        ChannelEncoding::Uint16 => {
            let values = pixel.as_uint();
            for (i, value) in values.iter().enumerate().take(channels) {
                let value = (*value).min(u16::MAX as u32) as u16;
                out[i * 2..i * 2 + 2].copy_from_slice(&value.to_le_bytes());
            }
        }
        ChannelEncoding::Uint32 => {
            let values = pixel.as_uint();
            for (i, value) in values.iter().enumerate().take(channels) {
                out[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
        ChannelEncoding::UintR10G10B10A2 => {
            let [r, g, b, a] = pixel.as_uint();
            let word = r.min(0x3ff) | (g.min(0x3ff) << 10) | (b.min(0x3ff) << 20) | (a.min(3) << 30);
            out[..4].copy_from_slice(&word.to_le_bytes());
        }
    }
}

/// Rounds a texel through the storage precision of `format`.
pub fn quantize(format: PixelFormat, pixel: Pixel) -> Pixel {
    let mut bytes = [0u8; MAX_BYTES_PER_PIXEL];
    encode_pixel(format, pixel, &mut bytes);
    decode_pixel(format, &bytes)
}

fn read4(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

fn encode_unorm(value: f32, bits: u32) -> u32 {
    let max = ((1u64 << bits) - 1) as f32;
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * max).round() as u32
}

/// Decodes an unsigned float with a 5-bit exponent and `mantissa_bits` of
/// mantissa, as used by the packed 11/11/10 format.
fn decode_small_float(bits: u32, mantissa_bits: u32) -> f32 {
    let exponent = (bits >> mantissa_bits) & 0x1f;
    let mantissa = bits & ((1 << mantissa_bits) - 1);
    let scale = (1u32 << mantissa_bits) as f32;
    match exponent {
        0 => mantissa as f32 / scale * 2f32.powi(-14),
        0x1f if mantissa == 0 => f32::INFINITY,
        0x1f => f32::NAN,
        _ => 2f32.powi(exponent as i32 - 15) * (1.0 + mantissa as f32 / scale),
    }
}

fn encode_small_float(value: f32, mantissa_bits: u32) -> u32 {
    let max_finite = (0x1e << mantissa_bits) | ((1 << mantissa_bits) - 1);
    if value.is_nan() {
        return (0x1f << mantissa_bits) | 1;
    }
    if value <= 0.0 {
        return 0;
    }
    if value.is_infinite() {
        return 0x1f << mantissa_bits;
    }

    let bits = value.to_bits();
    let exponent = ((bits >> 23) & 0xff) as i32 - 127;
    if exponent < -14 {
        // Denormal; rounding up into the first normal is encoded correctly as-is.
        let scaled = value * 2f32.powi(14) * (1u32 << mantissa_bits) as f32;
        return scaled.round() as u32;
    }
    if exponent > 15 {
        return max_finite;
    }

    let mantissa = bits & 0x7f_ffff;
    let shift = 23 - mantissa_bits;
    let mut encoded = (((exponent + 15) as u32) << mantissa_bits) | (mantissa >> shift);
    let remainder = mantissa & ((1 << shift) - 1);
    let half = 1 << (shift - 1);
    if remainder > half || (remainder == half && encoded & 1 == 1) {
        encoded += 1;
    }
    encoded.min(max_finite)
}

pub mod srgb {
    pub fn linear_to_srgb(linear: f32) -> f32 {
        if linear.is_nan() || linear <= 0.0 {
            0.0
        } else if linear < 0.003_130_8 {
            12.92 * linear
        } else if linear < 1.0 {
            1.055 * linear.powf(1.0 / 2.4) - 0.055
        } else {
            1.0
        }
    }

    pub fn srgb_to_linear(encoded: f32) -> f32 {
        if encoded <= 0.04045 {
            encoded / 12.92
        } else {
            ((encoded + 0.055) / 1.055).powf(2.4)
        }
    }

    /// Encodes the color channels; alpha stays linear.
    pub fn linear_to_srgb_rgba(color: [f32; 4]) -> [f32; 4] {
        [
            linear_to_srgb(color[0]),
            linear_to_srgb(color[1]),
            linear_to_srgb(color[2]),
            color[3],
        ]
    }
}
