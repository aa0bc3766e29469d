// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client pixel unpacking.
//!
//! Image data handed to a list is copied at compile time into a tightly
//! packed buffer, so replay is independent of the unpack state in effect
//! when the list is called.

use dlist_encoding::gl::{self, GLenum};

use crate::GlError;

/// The `GL_UNPACK_*` pixel store state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PixelStore {
    pub swap_bytes: bool,
    pub lsb_first: bool,
    pub row_length: u32,
    pub skip_rows: u32,
    pub skip_pixels: u32,
    pub alignment: u32,
}

impl PixelStore {
    /// Packing of data stored in a list: byte aligned rows, nothing skipped.
    pub const TIGHT: Self = Self {
        swap_bytes: false,
        lsb_first: false,
        row_length: 0,
        skip_rows: 0,
        skip_pixels: 0,
        alignment: 1,
    };

    /// Applies a `glPixelStorei` call.
    pub fn set(&mut self, pname: GLenum, param: i32) -> Result<(), GlError> {
        let count = || u32::try_from(param).map_err(|_| GlError::InvalidValue);
        match pname {
            gl::UNPACK_SWAP_BYTES => self.swap_bytes = param != 0,
            gl::UNPACK_LSB_FIRST => self.lsb_first = param != 0,
            gl::UNPACK_ROW_LENGTH => self.row_length = count()?,
            gl::UNPACK_SKIP_ROWS => self.skip_rows = count()?,
            gl::UNPACK_SKIP_PIXELS => self.skip_pixels = count()?,
            gl::UNPACK_ALIGNMENT => match param {
                1 | 2 | 4 | 8 => self.alignment = param as u32,
                _ => return Err(GlError::InvalidValue),
            },
            _ => return Err(GlError::InvalidEnum),
        }
        Ok(())
    }

    fn row_pixels(&self, width: usize) -> usize {
        if self.row_length > 0 {
            self.row_length as usize
        } else {
            width
        }
    }
}

impl Default for PixelStore {
    fn default() -> Self {
        Self {
            alignment: 4,
            ..Self::TIGHT
        }
    }
}

/// Why client data could not be unpacked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnpackError {
    /// The format/type pair is not supported.
    Format,
    /// A dimension is negative.
    Size,
    /// The client buffer is shorter than the unpack state requires.
    ShortData,
    /// The packed copy could not be allocated.
    OutOfMemory,
}

impl UnpackError {
    pub fn gl_error(self) -> GlError {
        match self {
            Self::Format => GlError::InvalidEnum,
            Self::Size | Self::ShortData => GlError::InvalidValue,
            Self::OutOfMemory => GlError::OutOfMemory,
        }
    }
}

fn components(format: GLenum) -> Option<usize> {
    Some(match format {
        gl::COLOR_INDEX
        | gl::STENCIL_INDEX
        | gl::DEPTH_COMPONENT
        | gl::RED
        | gl::GREEN
        | gl::BLUE
        | gl::ALPHA
        | gl::LUMINANCE => 1,
        gl::LUMINANCE_ALPHA | gl::RG => 2,
        gl::RGB | gl::BGR => 3,
        gl::RGBA | gl::BGRA => 4,
        _ => return None,
    })
}

fn type_size(ty: GLenum) -> Option<usize> {
    Some(match ty {
        gl::BYTE | gl::UNSIGNED_BYTE => 1,
        gl::SHORT | gl::UNSIGNED_SHORT | gl::HALF_FLOAT => 2,
        gl::INT | gl::UNSIGNED_INT | gl::FLOAT => 4,
        _ => return None,
    })
}

fn dimensions(width: i32, height: i32) -> Result<(usize, usize), UnpackError> {
    let width = usize::try_from(width).map_err(|_| UnpackError::Size)?;
    let height = usize::try_from(height).map_err(|_| UnpackError::Size)?;
    Ok((width, height))
}

fn align(value: usize, alignment: u32) -> Option<usize> {
    value.checked_next_multiple_of(alignment.max(1) as usize)
}

/// Bytes of client memory spanned by `rows` rows of `row_bytes` bytes each,
/// the first starting at `start` and the others `stride` bytes apart.
fn source_len(start: usize, stride: usize, rows: usize, row_bytes: usize) -> Option<usize> {
    if rows == 0 || row_bytes == 0 {
        return Some(0);
    }
    stride
        .checked_mul(rows - 1)?
        .checked_add(start)?
        .checked_add(row_bytes)
}

/// Allocates the packed copy. The size comes from the caller, so failure is
/// reported rather than aborting.
fn packed_buffer(row_bytes: usize, rows: usize) -> Result<Vec<u8>, UnpackError> {
    let len = row_bytes
        .checked_mul(rows)
        .ok_or(UnpackError::OutOfMemory)?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| UnpackError::OutOfMemory)?;
    Ok(out)
}

/// Copies a `width` x `height` image out of client memory into tightly
/// packed rows.
///
/// Byte swapping is applied to multi-byte components, so the result is in
/// native byte order.
pub fn unpack_image(
    width: i32,
    height: i32,
    format: GLenum,
    ty: GLenum,
    data: &[u8],
    unpack: &PixelStore,
) -> Result<Vec<u8>, UnpackError> {
    let (width, height) = dimensions(width, height)?;
    let element = type_size(ty).ok_or(UnpackError::Format)?;
    let group = components(format).ok_or(UnpackError::Format)? * element;
    // Sizes that overflow cannot be backed by client memory.
    let row_bytes = width.checked_mul(group).ok_or(UnpackError::ShortData)?;
    let stride = unpack
        .row_pixels(width)
        .checked_mul(group)
        .and_then(|bytes| align(bytes, unpack.alignment))
        .ok_or(UnpackError::ShortData)?;
    let start = (unpack.skip_rows as usize)
        .checked_mul(stride)
        .zip((unpack.skip_pixels as usize).checked_mul(group))
        .and_then(|(rows, pixels)| rows.checked_add(pixels))
        .ok_or(UnpackError::ShortData)?;
    let needed = source_len(start, stride, height, row_bytes).ok_or(UnpackError::ShortData)?;
    if needed > data.len() {
        return Err(UnpackError::ShortData);
    }

    let mut out = packed_buffer(row_bytes, height)?;
    for row in 0..height {
        let offset = start + row * stride;
        out.extend_from_slice(&data[offset..offset + row_bytes]);
    }
    if unpack.swap_bytes && element > 1 {
        for chunk in out.chunks_exact_mut(element) {
            chunk.reverse();
        }
    }
    Ok(out)
}

/// Number of bytes in one row of a tightly packed bitmap.
pub fn bitmap_row_bytes(width: u32) -> usize {
    (width as usize).div_ceil(8)
}

/// Copies a one bit per pixel bitmap out of client memory into tightly
/// packed, most significant bit first rows.
pub fn unpack_bitmap(
    width: i32,
    height: i32,
    data: &[u8],
    unpack: &PixelStore,
) -> Result<Vec<u8>, UnpackError> {
    let (width, height) = dimensions(width, height)?;
    let out_stride = width.div_ceil(8);
    let stride = align(unpack.row_pixels(width).div_ceil(8), unpack.alignment)
        .ok_or(UnpackError::ShortData)?;
    let skip_bits = unpack.skip_pixels as usize;
    // Bytes touched in each row, counted from the row start.
    let row_span = skip_bits
        .checked_add(width)
        .map(|bits| bits.div_ceil(8))
        .ok_or(UnpackError::ShortData)?;
    let start = (unpack.skip_rows as usize)
        .checked_mul(stride)
        .ok_or(UnpackError::ShortData)?;
    let needed = source_len(start, stride, height, if width > 0 { row_span } else { 0 })
        .ok_or(UnpackError::ShortData)?;
    if needed > data.len() {
        return Err(UnpackError::ShortData);
    }

    let mut out = packed_buffer(out_stride, height)?;
    out.resize(out_stride * height, 0);
    for row in 0..height {
        let row_start = start + row * stride;
        for x in 0..width {
            let bit = skip_bits + x;
            let byte = data[row_start + bit / 8];
            let set = if unpack.lsb_first {
                (byte >> (bit % 8)) & 1
            } else {
                (byte >> (7 - bit % 8)) & 1
            };
            if set != 0 {
                out[row * out_stride + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rows_are_four_byte_aligned() {
        // 3x2 RGB: rows of 9 bytes padded to 12.
        let mut data = vec![0_u8; 24];
        data[..9].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        data[12..21].copy_from_slice(&[10, 11, 12, 13, 14, 15, 16, 17, 18]);
        let out = unpack_image(3, 2, gl::RGB, gl::UNSIGNED_BYTE, &data, &PixelStore::default())
            .unwrap();
        assert_eq!(out, (1..=18).collect::<Vec<u8>>());
    }

    #[test]
    fn skips_and_row_length() {
        let unpack = PixelStore {
            row_length: 4,
            skip_rows: 1,
            skip_pixels: 2,
            ..PixelStore::TIGHT
        };
        let data: Vec<u8> = (0..12).collect();
        let out = unpack_image(2, 2, gl::LUMINANCE, gl::UNSIGNED_BYTE, &data, &unpack).unwrap();
        assert_eq!(out, [6, 7, 10, 11]);
    }

    #[test]
    fn swap_bytes_reverses_components() {
        let unpack = PixelStore {
            swap_bytes: true,
            ..PixelStore::TIGHT
        };
        let out =
            unpack_image(1, 1, gl::LUMINANCE_ALPHA, gl::UNSIGNED_SHORT, &[1, 2, 3, 4], &unpack)
                .unwrap();
        assert_eq!(out, [2, 1, 4, 3]);
    }

    #[test]
    fn short_data_is_rejected() {
        assert_eq!(
            unpack_image(4, 4, gl::RGBA, gl::UNSIGNED_BYTE, &[0; 60], &PixelStore::TIGHT),
            Err(UnpackError::ShortData)
        );
        assert_eq!(
            unpack_image(1, 1, gl::RGBA, 0x1234, &[0; 4], &PixelStore::TIGHT),
            Err(UnpackError::Format)
        );
    }

    #[test]
    fn huge_sizes_check_the_data_first() {
        let unpack = PixelStore::default();
        assert_eq!(
            unpack_bitmap(i32::MAX, i32::MAX, &[], &unpack),
            Err(UnpackError::ShortData)
        );
        assert_eq!(
            unpack_image(i32::MAX, i32::MAX, gl::RGBA, gl::FLOAT, &[], &unpack),
            Err(UnpackError::ShortData)
        );
        let skipped = PixelStore {
            skip_rows: u32::MAX,
            ..unpack
        };
        assert_eq!(
            unpack_bitmap(8, 1, &[0xff], &skipped),
            Err(UnpackError::ShortData)
        );
        // Empty images need no data at all.
        assert_eq!(unpack_bitmap(0, 3, &[], &unpack), Ok(Vec::new()));
    }

    #[test]
    fn bitmap_lsb_first_is_normalized() {
        let unpack = PixelStore {
            lsb_first: true,
            ..PixelStore::TIGHT
        };
        let out = unpack_bitmap(10, 1, &[0b0000_0001, 0b0000_0010], &unpack).unwrap();
        assert_eq!(out, [0b1000_0000, 0b0100_0000]);
    }

    #[test]
    fn bitmap_skip_pixels_shifts_bits() {
        let unpack = PixelStore {
            skip_pixels: 4,
            ..PixelStore::TIGHT
        };
        let out = unpack_bitmap(8, 1, &[0x0f, 0xa0], &unpack).unwrap();
        assert_eq!(out, [0xfa]);
        assert_eq!(bitmap_row_bytes(9), 2);
    }

    #[test]
    fn pixel_store_validation() {
        let mut unpack = PixelStore::default();
        assert_eq!(unpack.set(gl::UNPACK_ALIGNMENT, 3), Err(GlError::InvalidValue));
        assert_eq!(unpack.set(gl::UNPACK_ROW_LENGTH, -1), Err(GlError::InvalidValue));
        assert_eq!(unpack.set(0x1234, 1), Err(GlError::InvalidEnum));
        unpack.set(gl::UNPACK_ALIGNMENT, 8).unwrap();
        assert_eq!(unpack.alignment, 8);
    }
}
