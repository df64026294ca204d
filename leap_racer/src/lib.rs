//! # leap_racer
//!
//! Hand-gesture driving game.  A LeapMotion controller (or a simulated hand
//! driven from the keyboard and mouse) steers a car down a road of randomly
//! placed obstacles, rendered in a `minifb` window, with an engine hum on a
//! MIDI synthesiser that rises with speed.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Thumb raised high | Accelerate toward full speed |
//! | Thumb lowered | Slow down |
//! | Index fingertip above pinky tip | Steer left |
//! | Pinky tip above index fingertip | Steer right |
//! | Fist, or open palm with splayed fingers | Brake to a stop over 1.5 s |
//! | Index and middle fingers in a V | Boost at full speed for 1 s |
//! | Hand leaves the sensor | Keep course; after 3 s slow to a stop |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keyboard and mouse move a virtual hand.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `W` / `Up` (hold) | Raise the simulated thumb |
//! | `S` / `Down` (hold) | Lower the simulated thumb |
//! | `A` / `Left` (hold) | Tilt the simulated hand left |
//! | `D` / `Right` (hold) | Tilt the simulated hand right |
//! | `B` (hold) | Close the simulated hand into a fist (brake) |
//! | `V` (hold) | Make a V with the simulated hand (boost) |
//! | Left mouse drag | Place the simulated hand directly |
//! | `H` | Hide / show the simulated hand |
//! | `P` / `Space` / `Escape` | Pause / resume |
//! | `M` | Mute / unmute |
//! | `Q` or close window | Quit |

pub mod landmark;
pub mod scene;
pub mod engine;
pub mod visualizer;
pub mod app;
