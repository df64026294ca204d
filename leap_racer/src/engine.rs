//! Real-time engine sound thread.
//!
//! The game loop sends one [`EngineTone`] per frame; the thread keeps a
//! single note held on a MIDI output and retunes it with pitch bend and
//! channel volume.  Collisions fire a crash cymbal on the drum channel.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use racer_core::AudioSink;
use racer_tone::{EngineMidi, EngineTone};

// ════════════════════════════════════════════════════════════════════════════
// EngineCommand — sent to the engine thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineCommand {
    /// Current engine tone.
    Tone(EngineTone),
    /// One-shot collision sound.
    Crash,
    /// Release the engine note until the next tone.
    Silence,
    SetMuted(bool),
    /// Terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn send(&mut self, msg: &[u8]);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, msg: &[u8]) {
        let _ = self.conn.send(msg);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;
impl MidiOut for NullOut {
    fn send(&mut self, _msg: &[u8]) {}
}

/// Try to open the first available MIDI output port, preferring a
/// software synth.  Falls back to [`NullOut`] with a warning.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("leap_racer_engine") {
        Ok(m)  => m,
        Err(e) => {
            log::warn!("MIDI init error: {}; engine sound disabled", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        log::warn!("no MIDI output ports found; engine sound disabled");
        log::warn!("install a MIDI synthesiser such as `timidity -iA` or `fluidsynth` (Linux), \
                    CoreMIDI (macOS) or the GS Wavetable Synth (Windows)");
        return Box::new(NullOut);
    }

    let port_idx = ports.iter().enumerate()
        .find(|(_, p)| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gm") ||
                n.contains("synth")
            }).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port)
        .unwrap_or_else(|_| "Unknown".to_string());
    log::info!("opening MIDI port: {}", name);

    match midi_out.connect(port, "leap-racer-engine") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            log::warn!("failed to connect to {}: {}; engine sound disabled", name, e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineVoiceState — what the thread believes the synth is doing
// ════════════════════════════════════════════════════════════════════════════

/// How long the crash cymbal key stays down.
const CRASH_HOLD: Duration = Duration::from_millis(250);

struct EngineVoiceState {
    midi:        EngineMidi,
    sounding:    bool,
    muted:       bool,
    volume:      f32,
    /// Last (bend, volume) actually sent, to avoid flooding the port.
    last_sent:   Option<(u16, u8)>,
    crash_until: Option<Instant>,
}

impl EngineVoiceState {
    fn new(midi: EngineMidi, volume: f32, muted: bool) -> Self {
        EngineVoiceState {
            midi,
            sounding:    false,
            muted,
            volume:      volume.clamp(0.0, 1.0),
            last_sent:   None,
            crash_until: None,
        }
    }

    /// Apply one command.  Returns false once the thread should exit.
    fn handle(&mut self, cmd: EngineCommand, out: &mut dyn MidiOut, now: Instant) -> bool {
        match cmd {
            EngineCommand::Tone(tone) => {
                if self.muted || tone.amplitude <= 0.0 {
                    self.release(out);
                    return true;
                }
                let tone = EngineTone { amplitude: tone.amplitude * self.volume, ..tone };
                let key  = (self.midi.pitch_bend_for(tone.frequency), EngineMidi::volume_for(tone.amplitude));
                if !self.sounding {
                    for m in self.midi.start(tone) { out.send(&m); }
                    self.sounding  = true;
                    self.last_sent = Some(key);
                } else if self.last_sent != Some(key) {
                    for m in self.midi.update(tone) { out.send(&m); }
                    self.last_sent = Some(key);
                }
            }
            EngineCommand::Crash => {
                if !self.muted {
                    out.send(&self.midi.crash());
                    self.crash_until = Some(now + CRASH_HOLD);
                }
            }
            EngineCommand::Silence     => self.release(out),
            EngineCommand::SetMuted(m) => {
                self.muted = m;
                if m { self.release(out); }
            }
            EngineCommand::Quit => {
                self.release(out);
                self.expire_crash(out, None);
                return false;
            }
        }
        true
    }

    fn release(&mut self, out: &mut dyn MidiOut) {
        if self.sounding {
            for m in self.midi.stop() { out.send(&m); }
            self.sounding  = false;
            self.last_sent = None;
        }
    }

    /// Lift the cymbal key once its hold time is over (or now, for `None`).
    fn expire_crash(&mut self, out: &mut dyn MidiOut, now: Option<Instant>) {
        if let Some(until) = self.crash_until {
            if now.map_or(true, |n| n >= until) {
                out.send(&self.midi.crash_release());
                self.crash_until = None;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineAudio — handle to the engine thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the engine thread.  Implements [`AudioSink`] so the game loop
/// can drive it directly.
pub struct EngineAudio {
    cmd_tx: Sender<EngineCommand>,
    handle: Option<JoinHandle<()>>,
}

impl EngineAudio {
    /// Spawn the engine thread on the first usable MIDI port.
    pub fn spawn(midi: EngineMidi, volume: f32, muted: bool) -> Self {
        Self::spawn_with(midi, volume, muted, open_midi_output)
    }

    /// Spawn with an explicit output factory.  The factory runs on the
    /// engine thread, which then owns the device.
    pub fn spawn_with<O>(midi: EngineMidi, volume: f32, muted: bool, open: O) -> Self
    where
        O: FnOnce() -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let handle = thread::spawn(move || {
            let out = open();
            engine_thread(EngineVoiceState::new(midi, volume, muted), out, cmd_rx);
        });
        EngineAudio { cmd_tx, handle: Some(handle) }
    }

    pub fn send(&self, cmd: EngineCommand) {
        let _ = self.cmd_tx.send(cmd);
    }
}

impl AudioSink for EngineAudio {
    fn emit(&mut self, tone: EngineTone) { self.send(EngineCommand::Tone(tone)); }
    fn crash(&mut self)                  { self.send(EngineCommand::Crash); }
    fn silence(&mut self)                { self.send(EngineCommand::Silence); }
    fn set_muted(&mut self, muted: bool) { self.send(EngineCommand::SetMuted(muted)); }
}

impl Drop for EngineAudio {
    fn drop(&mut self) {
        self.send(EngineCommand::Quit);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// engine_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn engine_thread(mut state: EngineVoiceState, mut out: Box<dyn MidiOut>, cmd_rx: Receiver<EngineCommand>) {
    loop {
        let cmd = cmd_rx.recv_timeout(Duration::from_millis(20));
        let now = Instant::now();
        state.expire_crash(out.as_mut(), Some(now));
        match cmd {
            Ok(cmd) => {
                if !state.handle(cmd, out.as_mut(), now) { return; }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                state.release(out.as_mut());
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
