// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! polykernel: a stochastic single-molecule simulation core for
//! transcription and translation.
//!
//! A [`polymer::Polymer`] (or its [`genome::Genome`]/[`transcript::Transcript`]
//! specializations) models a 1-D track of DNA/RNA/protein: fixed
//! [`feature::Element`]s (promoters, terminators) sit on the track, a
//! [`feature::Mask`] bounds the region currently accessible to walkers, and
//! any number of [`feature::Polymerase`] walkers move along it one base pair
//! at a time, chosen by propensity-weighted stochastic selection.
//!
//! # Example
//!
//! ```rust
//! use polykernel::feature::{Element, Mask, Polymerase};
//! use polykernel::polymer::Polymer;
//!
//! let promoter = Element::promoter("promoter", 0, 40, vec!["rnap".to_string()]);
//! let mask = Mask::new("mask", 50, 100, Vec::<String>::new());
//! let mut polymer = Polymer::new("plasmid", 100, vec![promoter], mask, 1);
//!
//! let rnap = Polymerase::new("rnap", 30.0, 35);
//! let id = polymer.bind_polymerase(rnap, "promoter").unwrap();
//! assert!(polymer.walker(id).is_some());
//! ```

pub mod choice;
pub mod config;
pub mod error;
pub mod feature;
pub mod genome;
pub mod polymer;
pub mod signal;
pub mod transcript;

pub use error::{Error, Result};
pub use genome::{GeneTemplate, Genome};
pub use polymer::{Polymer, WalkerId};
pub use transcript::Transcript;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::choice;
    pub use crate::error::{Error, Result};
    pub use crate::feature::{Element, ElementKind, Mask, Polymerase, TerminatorParams};
    pub use crate::genome::{GeneTemplate, Genome};
    pub use crate::polymer::{Polymer, WalkerId};
    pub use crate::signal::Signal;
    pub use crate::transcript::Transcript;
}
