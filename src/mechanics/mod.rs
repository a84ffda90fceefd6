pub mod control;
pub mod geom;
pub mod physics;
pub mod stats;
pub mod stoch;
pub mod window;

pub use control::*;
pub use geom::*;
pub use physics::*;
pub use stats::*;
pub use stoch::*;
pub use window::*;
