//! Aufzeichnende Zeichenfläche für Analyser-Tests

use crate::analyser::{DrawSurface, Rgb};
use parking_lot::Mutex;

/// Ein aufgezeichneter Zeichenbefehl
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        color: Rgb,
        line_width: f32,
    },
}

/// Zeichenfläche, die nur mitschreibt
pub struct RecordingSurface {
    size: (f32, f32),
    ops: Mutex<Vec<DrawOp>>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: (width, height),
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.lock().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().clear();
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn clear(&self) {
        self.ops.lock().push(DrawOp::Clear);
    }

    fn fill_rect(&self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.ops.lock().push(DrawOp::FillRect { x, y, w, h, color });
    }

    fn stroke_polyline(&self, points: &[(f32, f32)], color: Rgb, line_width: f32) {
        self.ops.lock().push(DrawOp::Polyline {
            points: points.to_vec(),
            color,
            line_width,
        });
    }
}
