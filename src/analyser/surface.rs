//! Zeichenflächen-Capability
//!
//! Minimale Immediate-Mode-Schnittstelle, auf die der Analyser zeichnet.
//! Die eigentliche Darstellung (Fenster, Canvas, Terminal) ist Sache des
//! Aufrufers; in den Tests schreibt eine aufzeichnende Fläche nur mit.

/// Eine RGB-Farbe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
}

/// 2D-Zeichenfläche in Display-Größe
pub trait DrawSurface: Send + Sync {
    /// Breite und Höhe in Pixeln
    fn size(&self) -> (f32, f32);

    /// Setzt die Fläche auf den Hintergrund zurück
    fn clear(&self);

    /// Füllt ein Rechteck
    fn fill_rect(&self, x: f32, y: f32, w: f32, h: f32, color: Rgb);

    /// Zeichnet einen verbundenen Linienzug
    fn stroke_polyline(&self, points: &[(f32, f32)], color: Rgb, line_width: f32);
}
