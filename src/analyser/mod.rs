//! Analyser Module - Visualisierung
//!
//! Dieses Modul verwaltet:
//! - die Zeichenflächen-Capability (`DrawSurface`)
//! - die Zeit- und Frequenzbereichs-Analyse der PCM-Frames
//! - den ~60Hz Zeichen-Loop (Spektrum-Balken + Wellenform)

mod engine;
mod surface;

pub use engine::{
    AnalyserError, AudioAnalyser, FREQUENCY_BINS, FREQUENCY_FFT_SIZE, TIME_DOMAIN_WINDOW,
};
pub use surface::{DrawSurface, Rgb};
