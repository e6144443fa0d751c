//! # Strata Core
//!
//! Core types and traits for Strata, a history-preserving cellular automaton.
//!
//! This crate provides the fundamental building blocks:
//! - **Grid**: shape of a run and the parity addressing of generations
//! - **Brush**: circular stamps from normalized pointer positions
//! - **Rule**: the B3/S23 survival/birth transition
//! - **Frame**: caller-sized greyscale output surface
//! - **RunState**: current and viewed generation, brush state
//!
//! ## Memory Layout
//!
//! One byte per cell. Generation `g` lives in buffer A (even `g`) or B
//! (odd `g`) at layer `g >> 1`; see [`grid::GridShape::address_of`].

pub mod brush;
pub mod cell;
pub mod config;
pub mod error;
pub mod frame;
pub mod grid;
pub mod rule;
pub mod run;
pub mod traits;

// Re-export main types at crate root
pub use brush::BrushStamp;
pub use config::{BackendKind, StrataConfig};
pub use error::{StrataError, StrataResult};
pub use frame::Frame;
pub use grid::{BufferId, GridShape, Slot};
pub use rule::{EdgeMode, RuleParams};
pub use run::RunState;
pub use traits::*;
