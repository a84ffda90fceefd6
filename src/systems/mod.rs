// src/systems/mod.rs

pub mod sdk;
#[cfg(feature = "system-track")]       pub mod track;
#[cfg(feature = "system-skill")]       pub mod skill;
#[cfg(feature = "system-correlation")] pub mod correlation;
#[cfg(feature = "system-coordinator")] pub mod coordinator;
#[cfg(feature = "system-opponent")]    pub mod opponent;
#[cfg(feature = "system-adjuster")]    pub mod adjuster;
