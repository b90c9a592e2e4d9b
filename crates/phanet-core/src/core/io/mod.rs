//! # Report I/O Module
//!
//! Writers for the data files of an equilibrated network: crosslink positions
//! and the chain stretch distribution.

pub mod report;
