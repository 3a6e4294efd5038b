//! Values flowing through ports.
//!
//! `PortValue` is a closed sum over the payload kinds the engine moves
//! around. Port compatibility is decided on `ValueKind` tags alone.

use crate::error::Result;
use crate::pool::{BufferPool, SharedBuffer};
use std::fmt;
use std::sync::Arc;

/// Tag of a `PortValue` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Vector,
    Image,
    Format,
}

impl ValueKind {
    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn all() -> &'static [ValueKind] {
        &[
            ValueKind::Scalar,
            ValueKind::Vector,
            ValueKind::Image,
            ValueKind::Format,
        ]
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Set of kinds an input port will take.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcceptedKinds(u8);

impl AcceptedKinds {
    pub const NONE: AcceptedKinds = AcceptedKinds(0);
    pub const ANY: AcceptedKinds = AcceptedKinds(0b1111);

    pub const fn only(kind: ValueKind) -> Self {
        Self(kind.bit())
    }

    pub const fn any_of(kinds: &[ValueKind]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn with(self, kind: ValueKind) -> Self {
        Self(self.0 | kind.bit())
    }

    #[inline]
    pub const fn contains(self, kind: ValueKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = ValueKind> {
        ValueKind::all()
            .iter()
            .copied()
            .filter(move |k| self.contains(*k))
    }
}

impl fmt::Debug for AcceptedKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<ValueKind> for AcceptedKinds {
    fn from(kind: ValueKind) -> Self {
        Self::only(kind)
    }
}

/// Channel layout of an image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Gray,
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Shape of an image: dimensions plus channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

impl FormatDescriptor {
    pub const fn new(width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            layout,
        }
    }

    /// Number of `f32` elements an image of this format occupies.
    ///
    /// Saturates at `usize::MAX`, which no pool budget can satisfy.
    pub fn element_count(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.layout.channels())
    }
}

/// Image payload: a format plus pooled pixel storage.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    pub format: FormatDescriptor,
    pub pixels: SharedBuffer,
}

impl ImageFrame {
    /// Rent a zeroed image of the given format.
    pub fn rent(pool: &Arc<BufferPool>, format: FormatDescriptor) -> Result<Self> {
        Ok(Self {
            format,
            pixels: SharedBuffer::rent(pool, format.element_count())?,
        })
    }

    /// Rent an image and fill its pixels.
    pub fn rent_with(
        pool: &Arc<BufferPool>,
        format: FormatDescriptor,
        fill: impl FnOnce(&mut [f32]),
    ) -> Result<Self> {
        Ok(Self {
            format,
            pixels: SharedBuffer::rent_with(pool, format.element_count(), fill)?,
        })
    }

    pub fn pixels(&self) -> Result<&[f32]> {
        self.pixels.as_slice()
    }
}

/// A value held by a port.
#[derive(Debug, Clone)]
pub enum PortValue {
    Scalar(f64),
    Vector([f64; 4]),
    Image(ImageFrame),
    Format(FormatDescriptor),
}

impl PortValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PortValue::Scalar(_) => ValueKind::Scalar,
            PortValue::Vector(_) => ValueKind::Vector,
            PortValue::Image(_) => ValueKind::Image,
            PortValue::Format(_) => ValueKind::Format,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PortValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f64; 4]> {
        match self {
            PortValue::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageFrame> {
        match self {
            PortValue::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Format of a `Format` value, or of an `Image` value's pixels.
    pub fn as_format(&self) -> Option<FormatDescriptor> {
        match self {
            PortValue::Format(fmt) => Some(*fmt),
            PortValue::Image(img) => Some(img.format),
            _ => None,
        }
    }
}

impl From<f64> for PortValue {
    fn from(v: f64) -> Self {
        PortValue::Scalar(v)
    }
}

impl From<[f64; 4]> for PortValue {
    fn from(v: [f64; 4]) -> Self {
        PortValue::Vector(v)
    }
}

impl From<FormatDescriptor> for PortValue {
    fn from(v: FormatDescriptor) -> Self {
        PortValue::Format(v)
    }
}

impl From<ImageFrame> for PortValue {
    fn from(v: ImageFrame) -> Self {
        PortValue::Image(v)
    }
}
