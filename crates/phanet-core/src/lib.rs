//! # phanet Core Library
//!
//! A library for computing the force-balanced equilibrium positions of crosslinks
//! in polymer networks, using the phantom network approximation: only connectivity
//! and the entropic elasticity of the chain segments between crosslinks determine
//! the equilibrium, not excluded-volume interactions.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`MonomerGraph`),
//!   periodic-box geometry, and report I/O utilities.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer provides the crosslink
//!   connectivity lookup (`NetworkTopology`), the force-extension calibration
//!   (`ForceExtensionTable`), and the equilibrium move computation
//!   (`EquilibriumMoveEngine`).
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to drive a complete relaxation run,
//!   repeatedly nudging crosslinks toward the point where the net segment force
//!   vanishes.

pub mod core;
pub mod engine;
pub mod workflows;
