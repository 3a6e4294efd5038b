//! Test nodes implemented through `NodeProcessor`

use std::sync::{Arc, Mutex};
use tickgraph::error::Result;
use tickgraph::graph::value::ImageFrame;
use tickgraph::graph::{InputDescriptor, OutputDescriptor};
use tickgraph::{EngineError, NodeProcessor, ProcessContext, ValueKind};

/// Shared record of which nodes ran, in order
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

static SCALAR_IN: &[InputDescriptor] = &[InputDescriptor::of("in", ValueKind::Scalar)];
static SCALAR_OUT: &[OutputDescriptor] = &[OutputDescriptor::new("out", ValueKind::Scalar)];

/// Adds `offset` to its input (0 when absent) and logs every run
pub struct RecordingNode {
    label: String,
    offset: f64,
    log: EventLog,
}

impl RecordingNode {
    pub fn new(label: &str, offset: f64, log: &EventLog) -> Self {
        Self {
            label: label.to_string(),
            offset,
            log: log.clone(),
        }
    }
}

impl NodeProcessor for RecordingNode {
    fn name(&self) -> &str {
        &self.label
    }

    fn inputs(&self) -> &[InputDescriptor] {
        SCALAR_IN
    }

    fn outputs(&self) -> &[OutputDescriptor] {
        SCALAR_OUT
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        self.log.lock().unwrap().push(self.label.clone());
        let value = ctx.input_scalar(0).unwrap_or(0.0) + self.offset;
        ctx.set_output(0, value)
    }

    fn on_dispose(&mut self) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:disposed", self.label));
    }
}

/// Fails while `failing` is set, otherwise forwards its input
pub struct FlakyNode {
    failing: Arc<Mutex<bool>>,
}

impl FlakyNode {
    pub fn new(failing: &Arc<Mutex<bool>>) -> Self {
        Self {
            failing: failing.clone(),
        }
    }
}

impl NodeProcessor for FlakyNode {
    fn name(&self) -> &str {
        "Flaky"
    }

    fn inputs(&self) -> &[InputDescriptor] {
        SCALAR_IN
    }

    fn outputs(&self) -> &[OutputDescriptor] {
        SCALAR_OUT
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(EngineError::node(ctx.node(), "flaky failure"));
        }
        let value = ctx.input_scalar(0).unwrap_or(0.0);
        ctx.set_output(0, value)
    }
}

static IMAGE_IN: &[InputDescriptor] = &[InputDescriptor::of("image", ValueKind::Image)];
static IMAGE_OUT: &[OutputDescriptor] = &[OutputDescriptor::new("image", ValueKind::Image)];

/// Multiplies every pixel into a freshly rented frame
pub struct GainNode {
    pub gain: f32,
}

impl NodeProcessor for GainNode {
    fn name(&self) -> &str {
        "Gain"
    }

    fn inputs(&self) -> &[InputDescriptor] {
        IMAGE_IN
    }

    fn outputs(&self) -> &[OutputDescriptor] {
        IMAGE_OUT
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        let Some(src) = ctx.input_image(0).cloned() else {
            return Ok(());
        };
        let pixels = src.pixels()?;
        let gain = self.gain;
        let frame = ImageFrame::rent_with(ctx.pool(), src.format, |dst| {
            for (d, s) in dst.iter_mut().zip(pixels) {
                *d = s * gain;
            }
        })?;
        ctx.set_output(0, frame)
    }
}
