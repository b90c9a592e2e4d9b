//! # Core Models Module
//!
//! Data structures for representing a bonded polymer network off-lattice.
//!
//! ## Key Components
//!
//! - [`monomer`] - Individual monomer with a continuous position and mobility tag
//! - [`graph`] - The bonded monomer graph with cached adjacency
//! - [`builder`] - Procedural construction of reference networks
//!
//! Monomers are addressed by contiguous `usize` indices; a monomer with more
//! than two bonds acts as a crosslink (branch point) of the network.

pub mod builder;
pub mod graph;
pub mod monomer;
