//! # Core Module
//!
//! This module provides the fundamental building blocks for representing polymer
//! networks: the bonded monomer graph, the periodic simulation box, and the
//! report writers for equilibrated configurations.
//!
//! ## Architecture
//!
//! - **Network Representation** ([`models`]) - Monomers, bonds, and the network graph
//! - **Periodic Geometry** ([`geometry`]) - Box extents and minimum-image displacements
//! - **Report I/O** ([`io`]) - Writing equilibrated positions and chain stretch data

pub mod geometry;
pub mod io;
pub mod models;
