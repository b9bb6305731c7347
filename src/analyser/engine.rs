//! Audio-Analyser - Wellenform und Spektrum
//!
//! Liest die PCM-Frames eines Streams mit, hält ein Zeitfenster vor und
//! zeichnet pro Tick (~60Hz) ein Balken-Spektrum und die Wellenform auf
//! eine [`DrawSurface`]. Reine Analyse: es wird nichts hörbar ausgegeben.

use super::surface::{DrawSurface, Rgb};
use crate::capture::{AudioTrack, MediaStream};
use parking_lot::Mutex;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Fenstergröße der Zeitbereichs-Analyse (Samples)
pub const TIME_DOMAIN_WINDOW: usize = 2048;

/// FFT-Größe der Frequenzanalyse
pub const FREQUENCY_FFT_SIZE: usize = 512;

/// Anzahl Frequenz-Bins (halbe FFT-Größe)
pub const FREQUENCY_BINS: usize = FREQUENCY_FFT_SIZE / 2;

/// Untere dB-Grenze der Byte-Abbildung
const MIN_DECIBELS: f32 = -100.0;

/// Obere dB-Grenze der Byte-Abbildung
const MAX_DECIBELS: f32 = -30.0;

/// Zeitliche Glättung der Spektralwerte
const SMOOTHING: f32 = 0.8;

/// Tick-Intervall des Zeichen-Loops (~60Hz)
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum AnalyserError {
    #[error("Stream contains no audio track")]
    NoAudioTrack,
}

// ============================================================================
// BYTE CONVERSION
// ============================================================================

/// Bildet f32-Samples auf Zeitbereichs-Bytes ab (0.0 -> 128)
fn time_domain_bytes(window: &[f32]) -> Vec<u8> {
    window
        .iter()
        .map(|&s| (128.0 + s * 128.0).clamp(0.0, 255.0) as u8)
        .collect()
}

/// FFT über das jüngste Fenster, Magnitude -> dB -> Byte
///
/// Abbildung wie in der Web-Audio-API: Hann-Fenster, Glättung mit dem
/// vorherigen Tick, dB-Bereich [-100, -30] auf [0, 255].
fn frequency_bytes(
    samples: &[f32],
    fft: &dyn rustfft::Fft<f32>,
    smoothed: &mut [f32],
) -> Vec<u8> {
    debug_assert_eq!(samples.len(), FREQUENCY_FFT_SIZE);
    debug_assert_eq!(smoothed.len(), FREQUENCY_BINS);

    let n = FREQUENCY_FFT_SIZE as f32;

    // Hann-Fenster
    let mut buffer: Vec<Complex<f32>> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (n - 1.0)).cos());
            Complex::new(s * w, 0.0)
        })
        .collect();

    fft.process(&mut buffer);

    buffer[..FREQUENCY_BINS]
        .iter()
        .zip(smoothed.iter_mut())
        .map(|(bin, smooth)| {
            let magnitude = bin.norm() / n;
            *smooth = SMOOTHING * *smooth + (1.0 - SMOOTHING) * magnitude;

            let db = 20.0 * smooth.max(f32::MIN_POSITIVE).log10();
            let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            (scaled.clamp(0.0, 1.0) * 255.0) as u8
        })
        .collect()
}

// ============================================================================
// DRAWING
// ============================================================================

/// Balken-Spektrum: Höhe und Rot-Anteil proportional zur Magnitude
fn draw_frequency(surface: &dyn DrawSurface, bytes: &[u8]) {
    let (w, h) = surface.size();
    let bar_width = w / bytes.len() as f32 * 2.5;
    let mut x = 0.0;

    for &value in bytes {
        let bar_height = h * value as f32 / 256.0;
        let red = (bar_height + 100.0).clamp(0.0, 255.0) as u8;

        surface.fill_rect(x, h - bar_height, bar_width, bar_height, Rgb(red, 50, 50));
        x += bar_width + 1.0;
    }
}

/// Wellenform als verbundener Linienzug, Schlusspunkt auf der Mittellinie
fn draw_time_domain(surface: &dyn DrawSurface, bytes: &[u8]) {
    let (w, h) = surface.size();
    let slice_width = w / bytes.len() as f32;

    let mut points: Vec<(f32, f32)> = bytes
        .iter()
        .enumerate()
        .map(|(i, &value)| (i as f32 * slice_width, h * value as f32 / 256.0))
        .collect();
    points.push((w, h / 2.0));

    surface.stroke_polyline(&points, Rgb::GREEN, 1.0);
}

// ============================================================================
// ANALYSER
// ============================================================================

/// Der Analyser
///
/// `start` hängt sich an den ersten Track des Streams und spawnt den
/// Feed- und den Zeichen-Task; `stop` bricht beide ab und leert die
/// Fläche. `stop` ohne laufenden Loop ist ein No-op.
pub struct AudioAnalyser {
    window: Arc<Mutex<VecDeque<f32>>>,
    feed_task: Option<JoinHandle<()>>,
    render_task: Option<JoinHandle<()>>,
    surface: Option<Arc<dyn DrawSurface>>,
}

impl AudioAnalyser {
    pub fn new() -> Self {
        Self {
            window: Arc::new(Mutex::new(VecDeque::with_capacity(TIME_DOMAIN_WINDOW))),
            feed_task: None,
            render_task: None,
            surface: None,
        }
    }

    /// Startet Analyse und Zeichnen für den angegebenen Stream
    pub fn start(
        &mut self,
        stream: &MediaStream,
        surface: Arc<dyn DrawSurface>,
    ) -> Result<(), AnalyserError> {
        // Laufende Session zuerst beenden
        self.stop();

        let track = stream.first_audio_track().ok_or(AnalyserError::NoAudioTrack)?;
        let mut frames = track.subscribe_frames();

        // Feed-Task: Frames ins Zeitfenster schieben
        let window = Arc::clone(&self.window);
        self.feed_task = Some(tokio::spawn(async move {
            loop {
                match frames.recv().await {
                    Ok(frame) => {
                        let mut window = window.lock();
                        for &sample in frame.samples.iter() {
                            if window.len() == TIME_DOMAIN_WINDOW {
                                window.pop_front();
                            }
                            window.push_back(sample);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));

        // Zeichen-Task: pro Tick Spektrum und Wellenform
        let window = Arc::clone(&self.window);
        let render_surface = Arc::clone(&surface);
        self.render_task = Some(tokio::spawn(async move {
            let mut planner = FftPlanner::new();
            let fft = planner.plan_fft_forward(FREQUENCY_FFT_SIZE);
            let mut smoothed = vec![0.0f32; FREQUENCY_BINS];
            let mut interval = tokio::time::interval(FRAME_INTERVAL);

            loop {
                interval.tick().await;

                let snapshot: Vec<f32> = window.lock().iter().copied().collect();
                if snapshot.is_empty() {
                    continue;
                }

                let time_bytes = time_domain_bytes(&snapshot);

                // Jüngste FFT-Größe an Samples, vorne mit Stille aufgefüllt
                let mut fft_input = vec![0.0f32; FREQUENCY_FFT_SIZE];
                let take = snapshot.len().min(FREQUENCY_FFT_SIZE);
                fft_input[FREQUENCY_FFT_SIZE - take..]
                    .copy_from_slice(&snapshot[snapshot.len() - take..]);
                let freq_bytes = frequency_bytes(&fft_input, fft.as_ref(), &mut smoothed);

                render_surface.clear();
                draw_frequency(render_surface.as_ref(), &freq_bytes);
                draw_time_domain(render_surface.as_ref(), &time_bytes);
            }
        }));

        self.surface = Some(surface);
        Ok(())
    }

    /// Bricht den Zeichen-Loop ab und leert die Fläche
    pub fn stop(&mut self) {
        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
        if let Some(task) = self.render_task.take() {
            task.abort();
        }
        if let Some(surface) = self.surface.take() {
            surface.clear();
        }
        self.window.lock().clear();
    }
}

impl Default for AudioAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioAnalyser {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawOp, RecordingSurface};

    #[test]
    fn test_time_domain_byte_mapping() {
        let bytes = time_domain_bytes(&[0.0, 1.0, -1.0, 0.5]);

        // Nullsample liegt auf der Mittellinie
        assert_eq!(bytes[0], 128);
        assert_eq!(bytes[1], 255);
        assert_eq!(bytes[2], 0);
        assert_eq!(bytes[3], 192);
    }

    #[test]
    fn test_frequency_peak_at_expected_bin() {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FREQUENCY_FFT_SIZE);
        let mut smoothed = vec![0.0f32; FREQUENCY_BINS];

        // Sinus exakt auf Bin 8
        let samples: Vec<f32> = (0..FREQUENCY_FFT_SIZE)
            .map(|i| {
                (2.0 * std::f32::consts::PI * 8.0 * i as f32 / FREQUENCY_FFT_SIZE as f32).sin()
            })
            .collect();

        let bytes = frequency_bytes(&samples, fft.as_ref(), &mut smoothed);

        let peak = bytes
            .iter()
            .enumerate()
            .max_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 8);
    }

    #[test]
    fn test_draw_frequency_geometry() {
        let surface = RecordingSurface::new(512.0, 256.0);
        let bytes = vec![128u8; FREQUENCY_BINS];

        draw_frequency(&surface, &bytes);

        let ops = surface.ops();
        assert_eq!(ops.len(), FREQUENCY_BINS);

        // Balkenbreite: w / bins * 2.5
        match &ops[0] {
            DrawOp::FillRect { x, w, h, .. } => {
                assert_eq!(*x, 0.0);
                assert_eq!(*w, 5.0);
                assert_eq!(*h, 128.0);
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn test_draw_waveform_closes_on_midline() {
        let surface = RecordingSurface::new(512.0, 256.0);
        let bytes = vec![128u8; 64];

        draw_time_domain(&surface, &bytes);

        let ops = surface.ops();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            DrawOp::Polyline { points, color, .. } => {
                assert_eq!(points.len(), 65);
                assert_eq!(*points.last().unwrap(), (512.0, 128.0));
                assert_eq!(*color, Rgb::GREEN);
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut analyser = AudioAnalyser::new();
        analyser.stop();
        analyser.stop();
    }

    #[tokio::test]
    async fn test_render_loop_draws_and_stop_clears() {
        use crate::capture::{AudioSettings, AudioTrack, MediaStream};
        use crate::testing::{BackendLog, FakeAudioTrack};
        use std::sync::Arc;

        let log = Arc::new(BackendLog::new());
        let track = FakeAudioTrack::new(
            "Fake Microphone".to_string(),
            AudioSettings::default(),
            log,
        );
        let stream = MediaStream::new(vec![track.clone() as Arc<dyn AudioTrack>]);
        let surface = Arc::new(RecordingSurface::new(512.0, 256.0));

        let mut analyser = AudioAnalyser::new();
        analyser.start(&stream, surface.clone()).unwrap();

        // Frames einspeisen und ein paar Ticks abwarten
        track.push_frame(vec![0.25; 960], 48000);
        tokio::time::sleep(Duration::from_millis(80)).await;

        let ops = surface.ops();
        assert!(ops.contains(&DrawOp::Clear));
        assert!(ops.iter().any(|op| matches!(op, DrawOp::FillRect { .. })));
        assert!(ops.iter().any(|op| matches!(op, DrawOp::Polyline { .. })));

        surface.clear_ops();
        analyser.stop();

        // stop() leert die Fläche genau einmal
        assert_eq!(surface.ops(), vec![DrawOp::Clear]);
    }
}
