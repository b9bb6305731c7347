//! G.711 µ-law Codec für die Loopback-Medienbrücke
//!
//! Der ausgehende 48kHz-Track wird auf 8kHz dezimiert und µ-law-kodiert,
//! eingehende RTP-Payloads werden wieder zu f32-PCM expandiert. Bewusst
//! schmal gehalten; Opus wäre der nächste Schritt, braucht aber eine
//! native Build-Abhängigkeit.

/// µ-law Bias (Standardwert aus G.711)
const BIAS: i32 = 0x84;

/// Clipping-Grenze vor der Kompression
const CLIP: i32 = 32635;

/// Dezimationsfaktor 48kHz -> 8kHz
pub const DECIMATION: usize = 6;

/// Sample Rate des kodierten Signals
pub const G711_SAMPLE_RATE: u32 = 8000;

// ============================================================================
// SAMPLE CONVERSION
// ============================================================================

/// f32 [-1,1] nach i16
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// i16 nach f32 [-1,1]
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

// ============================================================================
// µ-LAW
// ============================================================================

/// Komprimiert ein lineares Sample nach µ-law
pub fn linear_to_ulaw(sample: i16) -> u8 {
    let sign: i32 = if sample < 0 { 0x80 } else { 0 };
    let mut magnitude = (sample as i32).abs().min(CLIP) + BIAS;

    let mut exponent: i32 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && (magnitude & mask) == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;
    !((sign | (exponent << 4) | mantissa) as u8)
}

/// Expandiert ein µ-law Byte zurück zu linear
pub fn ulaw_to_linear(encoded: u8) -> i16 {
    let value = !encoded;
    let sign = value & 0x80;
    let exponent = ((value >> 4) & 0x07) as i32;
    let mantissa = (value & 0x0F) as i32;

    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;

    if sign != 0 {
        -(magnitude as i16)
    } else {
        magnitude as i16
    }
}

// ============================================================================
// FRAME CODEC
// ============================================================================

/// Dezimiert ein 48kHz-Frame auf 8kHz und kodiert es µ-law
///
/// Dezimation per Blockmittelwert; für Sprache im Loopback ausreichend.
pub fn encode_frame(samples: &[f32]) -> Vec<u8> {
    samples
        .chunks(DECIMATION)
        .map(|chunk| {
            let avg = chunk.iter().sum::<f32>() / chunk.len() as f32;
            linear_to_ulaw(f32_to_i16(avg))
        })
        .collect()
}

/// Dekodiert eine µ-law Payload zu f32-PCM (8kHz)
pub fn decode_payload(payload: &[u8]) -> Vec<f32> {
    payload
        .iter()
        .map(|&b| i16_to_f32(ulaw_to_linear(b)))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ulaw_silence() {
        // Stille muss nach Dekodierung nahe Null bleiben
        let encoded = linear_to_ulaw(0);
        let decoded = ulaw_to_linear(encoded);
        assert!(decoded.abs() < 16);
    }

    #[test]
    fn test_ulaw_sign_preserved() {
        assert!(ulaw_to_linear(linear_to_ulaw(12000)) > 0);
        assert!(ulaw_to_linear(linear_to_ulaw(-12000)) < 0);
    }

    #[test]
    fn test_ulaw_monotonic_magnitude() {
        // µ-law ist verlustbehaftet, aber die Größenordnung muss stimmen
        let small = ulaw_to_linear(linear_to_ulaw(500)).abs();
        let large = ulaw_to_linear(linear_to_ulaw(20000)).abs();
        assert!(large > small);
    }

    #[test]
    fn test_encode_frame_decimates() {
        let frame = vec![0.25f32; 960];
        let encoded = encode_frame(&frame);
        assert_eq!(encoded.len(), 160);
    }

    #[test]
    fn test_roundtrip_tolerance() {
        // Relative Abweichung bei mittlerer Aussteuerung unter ~5%
        let original = 0.5f32;
        let decoded = i16_to_f32(ulaw_to_linear(linear_to_ulaw(f32_to_i16(original))));
        assert!((decoded - original).abs() < 0.05);
    }
}
