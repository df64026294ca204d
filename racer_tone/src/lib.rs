//! # racer_tone
//!
//! Engine sound for the racer: maps car speed to a tone and turns tones into
//! either raw PCM (an additive "engine" oscillator) or MIDI messages for a
//! held, pitch-bent engine note.
//!
//! * **speed 0.0** → idle, 220 Hz at amplitude 0.3
//! * **speed 1.0** → boost, 440 Hz at amplitude 0.8
//!
//! No external crates are required; WAV and MIDI bytes are written directly.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use racer_tone::{ToneMap, EngineVoice, render_wav};
//!
//! let map   = ToneMap::default();
//! let mut v = EngineVoice::new(44_100);
//! let mut pcm = vec![0.0f32; 44_100];
//! v.set_tone(map.tone_for(0.5));
//! v.fill(&mut pcm);
//! std::fs::write("engine.wav", render_wav(&pcm, 44_100)).unwrap();
//! ```

use std::io::Write;

// ════════════════════════════════════════════════════════════════════════════
// EngineTone / ToneMap — speed → frequency + amplitude
// ════════════════════════════════════════════════════════════════════════════

/// One audio-feedback request: what the engine should sound like right now.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineTone {
    /// Fundamental frequency in Hz.
    pub frequency: f32,
    /// Linear gain in `[0, 1]`.
    pub amplitude: f32,
}

impl EngineTone {
    pub const SILENT: EngineTone = EngineTone { frequency: 0.0, amplitude: 0.0 };
}

/// Linear map from speed in `[0, 1]` to a tone.
///
/// Both frequency and amplitude are monotonically non-decreasing in speed
/// as long as `max_* >= base_*` / `min_amplitude`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneMap {
    pub base_freq:     f32,
    pub max_freq:      f32,
    pub min_amplitude: f32,
    pub max_amplitude: f32,
}

impl Default for ToneMap {
    fn default() -> Self {
        ToneMap { base_freq: 220.0, max_freq: 440.0, min_amplitude: 0.3, max_amplitude: 0.8 }
    }
}

impl ToneMap {
    /// Tone for a given speed.  Out-of-range (and NaN) speeds are clamped.
    pub fn tone_for(&self, speed: f32) -> EngineTone {
        let s = if speed.is_nan() { 0.0 } else { speed.clamp(0.0, 1.0) };
        EngineTone {
            frequency: self.base_freq + s * (self.max_freq - self.base_freq),
            amplitude: (self.min_amplitude + s * (self.max_amplitude - self.min_amplitude))
                .clamp(0.0, 1.0),
        }
    }

    /// True when the map is usable: positive frequencies, ordered bounds,
    /// amplitudes in `[0, 1]`.
    pub fn is_consistent(&self) -> bool {
        self.base_freq > 0.0
            && self.max_freq >= self.base_freq
            && (0.0..=1.0).contains(&self.min_amplitude)
            && (0.0..=1.0).contains(&self.max_amplitude)
            && self.max_amplitude >= self.min_amplitude
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineVoice — additive oscillator
// ════════════════════════════════════════════════════════════════════════════

/// Relative weights of the 1st, 2nd and 3rd harmonic.
const HARMONICS: [f32; 3] = [1.0, 0.5, 0.25];

/// Phase-continuous engine oscillator.
///
/// Changing the tone between buffers never resets the phase, and the new
/// frequency/amplitude are ramped in across the next buffer, so there is no
/// click at the boundary.
#[derive(Clone, Debug)]
pub struct EngineVoice {
    sample_rate: u32,
    phase:       f32,
    current:     EngineTone,
    target:      EngineTone,
}

impl EngineVoice {
    pub fn new(sample_rate: u32) -> Self {
        EngineVoice {
            sample_rate: sample_rate.max(1),
            phase:       0.0,
            current:     EngineTone::SILENT,
            target:      EngineTone::SILENT,
        }
    }

    pub fn sample_rate(&self) -> u32 { self.sample_rate }

    /// Tone that the next `fill` glides toward.
    pub fn set_tone(&mut self, tone: EngineTone) {
        self.target = tone;
    }

    pub fn tone(&self) -> EngineTone { self.current }

    /// Render `out.len()` samples in `[-1, 1]`.
    pub fn fill(&mut self, out: &mut [f32]) {
        let n    = out.len().max(1) as f32;
        let from = self.current;
        let to   = self.target;
        let norm: f32 = HARMONICS.iter().sum();
        let tau  = std::f32::consts::TAU;

        for (i, slot) in out.iter_mut().enumerate() {
            let t    = (i + 1) as f32 / n;
            let freq = from.frequency + (to.frequency - from.frequency) * t;
            let amp  = from.amplitude + (to.amplitude - from.amplitude) * t;

            let mut v = 0.0;
            for (k, w) in HARMONICS.iter().enumerate() {
                v += w * (tau * self.phase * (k + 1) as f32).sin();
            }
            *slot = (amp * v / norm).clamp(-1.0, 1.0);

            self.phase = (self.phase + freq.max(0.0) / self.sample_rate as f32).fract();
        }
        self.current = to;
    }

    /// Convenience: render `seconds` of audio held at `tone` from the first
    /// sample, with no glide from the previous tone.
    pub fn render(&mut self, tone: EngineTone, seconds: f32) -> Vec<f32> {
        let len = (seconds.max(0.0) * self.sample_rate as f32).round() as usize;
        let mut out = vec![0.0; len];
        self.set_tone(tone);
        self.current = tone;
        self.fill(&mut out);
        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WAV serialisation
// ════════════════════════════════════════════════════════════════════════════

/// Mono 16-bit PCM WAV file holding `samples`.
pub fn render_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);

    // ── RIFF header ───────────────────────────────────────────────────────
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // ── fmt chunk ─────────────────────────────────────────────────────────
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());            // PCM
    out.extend_from_slice(&1u16.to_le_bytes());            // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    out.extend_from_slice(&2u16.to_le_bytes());            // block align
    out.extend_from_slice(&16u16.to_le_bytes());           // bits per sample

    // ── data chunk ────────────────────────────────────────────────────────
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Write [`render_wav`] output to `path`.
pub fn write_wav(path: &str, samples: &[f32], sample_rate: u32) -> std::io::Result<()> {
    let mut f = std::fs::File::create(path)?;
    f.write_all(&render_wav(samples, sample_rate))
}

// ════════════════════════════════════════════════════════════════════════════
// EngineProgram — General MIDI voices that make a passable engine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineProgram {
    OverdrivenGuitar = 29,
    DistortionGuitar = 30,
    SynthBass1       = 38,
    SynthBass2       = 39,
    Cello            = 42,
    Tuba             = 58,
    SawLead          = 81,
    Helicopter       = 125,
}

impl EngineProgram {
    pub fn program(self) -> u8 { self as u8 }

    pub fn name(self) -> &'static str {
        match self {
            EngineProgram::OverdrivenGuitar => "Overdriven Guitar",
            EngineProgram::DistortionGuitar => "Distortion Guitar",
            EngineProgram::SynthBass1       => "Synth Bass 1",
            EngineProgram::SynthBass2       => "Synth Bass 2",
            EngineProgram::Cello            => "Cello",
            EngineProgram::Tuba             => "Tuba",
            EngineProgram::SawLead          => "Saw Lead",
            EngineProgram::Helicopter       => "Helicopter",
        }
    }

    pub fn all() -> &'static [EngineProgram] {
        &[
            EngineProgram::OverdrivenGuitar,
            EngineProgram::DistortionGuitar,
            EngineProgram::SynthBass1,
            EngineProgram::SynthBass2,
            EngineProgram::Cello,
            EngineProgram::Tuba,
            EngineProgram::SawLead,
            EngineProgram::Helicopter,
        ]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineMidi — held note + pitch bend
// ════════════════════════════════════════════════════════════════════════════

/// A raw MIDI channel message (2 or 3 bytes).
pub type MidiMessage = Vec<u8>;

/// Fractional MIDI note number for a frequency (A4 = 440 Hz = 69).
pub fn midi_note_for(hz: f32) -> f32 {
    if hz <= 0.0 { return 0.0; }
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Builds the messages for a continuous engine voice: one held root note
/// whose pitch follows the tone through pitch bend, with channel volume
/// following the amplitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineMidi {
    pub channel:    u8,
    pub program:    u8,
    /// Held note; its pitch is the tone at bend centre.
    pub root_note:  u8,
    /// Semitones covered by a full bend in either direction.
    pub bend_range: u8,
}

impl Default for EngineMidi {
    /// A3 (220 Hz) with a one-octave bend, which covers the default
    /// [`ToneMap`] exactly.
    fn default() -> Self {
        EngineMidi {
            channel:    0,
            program:    EngineProgram::SawLead.program(),
            root_note:  57,
            bend_range: 12,
        }
    }
}

/// General MIDI percussion channel and crash cymbal key.
const DRUM_CHANNEL: u8 = 9;
const CRASH_CYMBAL: u8 = 49;

impl EngineMidi {
    fn ch(&self) -> u8 { self.channel & 0x0F }

    /// 14-bit bend value that moves the root note to `hz`.  8192 is centre.
    pub fn pitch_bend_for(&self, hz: f32) -> u16 {
        let range = self.bend_range.max(1) as f32;
        let semis = midi_note_for(hz) - self.root_note as f32;
        let value = 8192.0 + semis / range * 8192.0;
        value.round().clamp(0.0, 16383.0) as u16
    }

    pub fn pitch_bend(&self, value: u16) -> MidiMessage {
        let v = value.min(16383);
        vec![0xE0 | self.ch(), (v & 0x7F) as u8, (v >> 7) as u8]
    }

    /// CC7 value for an amplitude in `[0, 1]`.
    pub fn volume_for(amplitude: f32) -> u8 {
        (amplitude.clamp(0.0, 1.0) * 127.0).round() as u8
    }

    /// Bend range RPN, program, initial bend and volume, then the held note.
    pub fn start(&self, tone: EngineTone) -> Vec<MidiMessage> {
        let ch = self.ch();
        let mut out = vec![
            vec![0xB0 | ch, 101, 0],
            vec![0xB0 | ch, 100, 0],
            vec![0xB0 | ch, 6, self.bend_range.min(127)],
            vec![0xB0 | ch, 38, 0],
            vec![0xC0 | ch, self.program.min(127)],
        ];
        out.extend(self.update(tone));
        out.push(vec![0x90 | ch, self.root_note.min(127), 100]);
        out
    }

    /// Messages that retune the held note to `tone`.
    pub fn update(&self, tone: EngineTone) -> Vec<MidiMessage> {
        vec![
            self.pitch_bend(self.pitch_bend_for(tone.frequency)),
            vec![0xB0 | self.ch(), 7, Self::volume_for(tone.amplitude)],
        ]
    }

    /// Release the held note and re-centre the bend.
    pub fn stop(&self) -> Vec<MidiMessage> {
        vec![
            vec![0x80 | self.ch(), self.root_note.min(127), 0],
            self.pitch_bend(8192),
        ]
    }

    /// One-shot crash cymbal on the percussion channel.
    pub fn crash(&self) -> MidiMessage {
        vec![0x90 | DRUM_CHANNEL, CRASH_CYMBAL, 120]
    }

    pub fn crash_release(&self) -> MidiMessage {
        vec![0x80 | DRUM_CHANNEL, CRASH_CYMBAL, 0]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
