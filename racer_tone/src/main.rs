//! Interactive menu for auditioning engine tones as WAV files.

use racer_tone::{EngineVoice, ToneMap, write_wav};
use std::io::{self, BufRead, Write};

const SAMPLE_RATE: u32 = 44_100;

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║               Racer Engine Tone Renderer                 ║");
    println!("║   speed 0 → idle 220 Hz   |   speed 1 → boost 440 Hz     ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    loop {
        println!("  Main menu:");
        println!("    1. Render a fixed speed");
        println!("    2. Render an idle → boost → idle sweep");
        println!("    q. Quit");
        println!();

        let Some(choice) = read_line("Choice: ") else {
            println!("\nGoodbye!\n");
            break;
        };
        match choice.trim() {
            "1" => render_fixed(),
            "2" => render_sweep(),
            "q" | "quit" => { println!("\nGoodbye!\n"); break; }
            _   => println!("  ⚠  Enter 1, 2 or q.\n"),
        }
        println!();
    }
}

fn render_fixed() {
    println!("\n  ── Fixed speed ──");
    let speed: f32 = answer("  Speed 0.0–1.0 (default 0.5): ")
        .trim().parse().unwrap_or(0.5);
    let secs: f32 = answer("  Seconds (default 2): ")
        .trim().parse().unwrap_or(2.0);
    let filename = filename_or("engine.wav");

    let tone = ToneMap::default().tone_for(speed);
    let pcm  = EngineVoice::new(SAMPLE_RATE).render(tone, secs.clamp(0.1, 60.0));
    save(&filename, &pcm, &format!("{:.0} Hz @ {:.2}", tone.frequency, tone.amplitude));
}

fn render_sweep() {
    println!("\n  ── Sweep ──");
    let secs: f32 = answer("  Seconds (default 4): ")
        .trim().parse().unwrap_or(4.0);
    let filename = filename_or("sweep.wav");

    let map   = ToneMap::default();
    let mut v = EngineVoice::new(SAMPLE_RATE);
    let block = (SAMPLE_RATE / 100) as usize;
    let steps = ((secs.clamp(0.5, 60.0) * 100.0) as usize).max(2);
    let mut pcm = Vec::with_capacity(steps * block);
    let mut buf = vec![0.0; block];

    for i in 0..steps {
        // Triangle: up for the first half, down for the second.
        let t = i as f32 / (steps - 1) as f32;
        let speed = 1.0 - (2.0 * t - 1.0).abs();
        v.set_tone(map.tone_for(speed));
        v.fill(&mut buf);
        pcm.extend_from_slice(&buf);
    }
    save(&filename, &pcm, "sweep");
}

fn save(filename: &str, pcm: &[f32], what: &str) {
    match write_wav(filename, pcm, SAMPLE_RATE) {
        Ok(_)  => println!("\n  ✓  Written {} ({} samples) to '{}'\n", what, pcm.len(), filename),
        Err(e) => println!("  ⚠  File error: {}", e),
    }
}

fn filename_or(default: &str) -> String {
    let name = answer(&format!("  Output filename (default: {}): ", default))
        .trim().to_string();
    if name.is_empty() { default.to_string() } else { name }
}

/// `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    next_line(&mut io::stdin().lock())
}

/// Answer to a sub-prompt; a closed stdin takes the default.
fn answer(prompt: &str) -> String {
    read_line(prompt).unwrap_or_default()
}

fn next_line(input: &mut impl BufRead) -> Option<String> {
    let mut s = String::new();
    match input.read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_)          => Some(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn closed_input_ends_the_menu() {
        let mut input = Cursor::new("2\n\n".as_bytes());
        assert_eq!(next_line(&mut input).as_deref(), Some("2\n"));
        assert_eq!(next_line(&mut input).as_deref(), Some("\n"));
        assert_eq!(next_line(&mut input), None);
        assert_eq!(next_line(&mut input), None);
    }

    #[test]
    fn empty_stdin_reads_as_closed() {
        assert_eq!(next_line(&mut Cursor::new(Vec::new())), None);
    }
}
