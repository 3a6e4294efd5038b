//! SolidImageNode: produces an image filled with one level.
//!
//! Inputs: `format` (Format) and `level` (Scalar, defaults to 0). The pixel
//! storage is rented from the engine's buffer pool each evaluation; the
//! frame it replaces goes back to the pool once downstream inputs let go.

use crate::error::{EngineError, Result};
use crate::graph::node::ProcessContext;
use crate::graph::port::{InputDescriptor, OutputDescriptor};
use crate::graph::value::{ImageFrame, ValueKind};

static INPUTS: &[InputDescriptor] = &[
    InputDescriptor::of("format", ValueKind::Format),
    InputDescriptor::of("level", ValueKind::Scalar),
];

static OUTPUTS: &[OutputDescriptor] = &[OutputDescriptor::new("image", ValueKind::Image)];

#[derive(Default)]
pub struct SolidImageNode;

impl SolidImageNode {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "SolidImage"
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        INPUTS
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        OUTPUTS
    }

    pub fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        let format = ctx
            .input_format(0)
            .ok_or_else(|| EngineError::node(ctx.node(), "no image format available"))?;
        let level = ctx.input_scalar(1).unwrap_or(0.0) as f32;

        let frame = ImageFrame::rent_with(ctx.pool(), format, |px| px.fill(level))?;
        ctx.set_output(0, frame)
    }
}
