/*!
`race_balance`: closed-loop dynamic difficulty for racing.

What it does
- Turns a ring of track waypoints into per-segment safe speeds and an ideal
  speed/time profile that respects braking distances (`systems::track`).
- Scores the player against that profile, segment by segment
  (`systems::skill`).
- Measures how alike the player and the opponent drive: shifted correlation
  of steering, speed and trajectory (`systems::correlation`).
- Blends track and opponent complexity through an adaptive weight that keeps
  the race inside a slowly rising difficulty band (`systems::coordinator`).
- Evolves two opponent parameter sets and picks one from the standings
  (`systems::opponent`), and rubber-bands the player's vehicle limits
  (`systems::adjuster`).

How to use (call surface only)
- Implement the collaborator traits in `systems::sdk` over your engine:
  `EnvironmentSampler`, `RaceStandings`, and `ParameterSink` for both vehicles.
- Build a `RaceSession` from a `BalanceConfig`, the track waypoints and the
  collaborators, then call `tick(now, dt)` once per frame and
  `register_collision(kind)` from your physics callbacks.
- Or use any system on its own; each takes plain inputs.

What it does NOT do
- No rendering, no scene discovery, no persistence. Logging goes through
  `tracing`; install a subscriber if you want to see it.
*/

pub mod error;
pub mod mechanics;
pub mod systems;
pub mod genres;

#[cfg(feature = "genre-racing")]
pub mod config;

pub use error::{BalanceError, Result};

#[cfg(feature = "genre-racing")]
pub use config::BalanceConfig;
#[cfg(feature = "genre-racing")]
pub use genres::racing::{Collaborators, RaceSession, SessionSnapshot, TickReport};
