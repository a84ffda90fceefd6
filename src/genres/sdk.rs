// src/genres/sdk.rs

//! # Genre SDK
//!
//! Glue for building **genres** out of multiple **systems**.
//!
//! A genre is the orchestrator that owns several systems and advances them
//! together in a fixed order, handing each one the plain values it needs from
//! the others. The `racing` genre runs, per frame:
//!
//! 1. `track`: which segment is the player on, and at what ideal speed?
//! 2. `skill`: close out the previous segment if the player just left it.
//! 3. `correlation`: sample both agents, analyse once the window is full.
//! 4. `coordinator`: blend track and opponent complexity into `alpha`.
//! 5. `opponent` and `adjuster`: push tuned values onto both vehicles.
//!
//! ## Signals
//! [`Signals`] carries the cross-system quantities of the latest frame. Each
//! step reads the previous frame's signals and returns the new ones, so a
//! genre is easy to drive from a plain loop ([`run_ticks`]) or from a game
//! engine's frame callback. Extend it only when a new system actually needs a
//! new shared quantity.

use serde::{Deserialize, Serialize};

/// Shared per-frame quantities threaded between systems.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// Seconds since the session started.
    pub now: f64,
    pub skill: f64,
    pub correlation: f64,
    pub losing_frequency: f64,
    pub alpha: f64,
    /// Rubber-band error; `None` while the player is off the track.
    pub delta_p: Option<f64>,
    pub segment: Option<usize>,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            now: 0.0,
            skill: 0.5,
            correlation: 0.5,
            losing_frequency: 0.5,
            alpha: 0.5,
            delta_p: None,
            segment: None,
        }
    }
}

/// Drive `ticks` fixed-`dt` frames starting at `start`. Each `step` gets the
/// frame time and the previous signals, and returns the new signals plus a
/// per-frame output that is collected.
pub fn run_ticks<F, T>(
    mut signals: Signals,
    start: f64,
    dt: f64,
    ticks: usize,
    mut step: F,
) -> (Signals, Vec<T>)
where
    F: FnMut(f64, Signals) -> (Signals, T),
{
    let mut outs = Vec::with_capacity(ticks);
    for i in 0..ticks {
        let now = start + dt * i as f64;
        let (next, out) = step(now, signals);
        signals = next;
        outs.push(out);
    }
    (signals, outs)
}
