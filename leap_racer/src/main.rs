//! leap_racer — interactive entry point.

use leap_racer::app::{run, AppConfig};
use leap_racer::landmark::InputKind;
use racer_core::GameMode;
use racer_tone::EngineProgram;
use std::io::{self, Write};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("RACER_LOG_LEVEL", "info")
            .write_style("RACER_LOG_STYLE"),
    )
    .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Leap Racer — Hand-Gesture Driving Game              ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Input: LeapMotion hardware (simulation also available)");
    #[cfg(not(feature = "leap"))]
    println!("  Input: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let mut cfg = if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: Normal mode, default input, saw lead engine\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };
    if let Some(seed) = seed_arg(&args) {
        cfg.seed = Some(seed);
    }

    println!();
    println!("  Opening game window…");
    println!();

    match run(cfg) {
        Ok(summary) => {
            println!();
            println!("  Final: {}", summary);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// `--seed N` anywhere on the command line.
fn seed_arg(args: &[String]) -> Option<u64> {
    let pos = args.iter().position(|a| a == "--seed")?;
    args.get(pos + 1)?.parse().ok()
}

fn configure_interactively() -> AppConfig {
    let mode    = pick_mode();
    let input   = pick_input();
    let program = pick_program();
    let volume: f32 = read_line("  Engine volume 0–100 (default 80, 0 = muted): ")
        .trim().parse::<u32>().unwrap_or(80).min(100) as f32 / 100.0;

    AppConfig {
        input,
        mode,
        program,
        volume,
        muted: volume == 0.0,
        ..AppConfig::default()
    }
}

fn pick_mode() -> GameMode {
    println!("  Game mode:");
    for (i, m) in GameMode::all().iter().enumerate() {
        println!("    {}. {:<10} {}", i + 1, m.name(), m.description());
    }
    let n = GameMode::all().len();
    let choice = read_line(&format!("  Choice (1–{}, default 3): ", n))
        .trim().parse::<usize>().unwrap_or(3);
    GameMode::all().get(choice.wrapping_sub(1)).copied().unwrap_or_default()
}

#[cfg(feature = "leap")]
fn pick_input() -> InputKind {
    println!("  Input: 1=LeapMotion  2=Keyboard/mouse simulation");
    match read_line("  Choice (default 1): ").trim() {
        "2" => InputKind::Simulated,
        _   => InputKind::Leap,
    }
}

#[cfg(not(feature = "leap"))]
fn pick_input() -> InputKind {
    InputKind::Simulated
}

fn pick_program() -> u8 {
    println!("  Engine sound:");
    for (i, p) in EngineProgram::all().iter().enumerate() {
        println!("    {}. {:<14} (GM {})", i + 1, p.name(), p.program());
    }
    let all = EngineProgram::all();
    let default = all.iter().position(|&p| p == EngineProgram::SawLead).unwrap_or(0) + 1;
    let choice = read_line(&format!("  Choice (default {}): ", default))
        .trim().parse::<usize>().unwrap_or(default);
    all.get(choice.wrapping_sub(1))
        .copied()
        .unwrap_or(EngineProgram::SawLead)
        .program()
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn seed_argument_parses() {
        assert_eq!(seed_arg(&args(&["leap_racer", "--seed", "17"])), Some(17));
        assert_eq!(seed_arg(&args(&["leap_racer", "--seed"])), None);
        assert_eq!(seed_arg(&args(&["leap_racer", "--seed", "x"])), None);
        assert_eq!(seed_arg(&args(&["leap_racer", "--quick"])), None);
    }
}
