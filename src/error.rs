//! Kernel error types.
//!
//! Every fallible operation on [`crate::polymer::Polymer`] (and its `Genome`/
//! `Transcript` specializations) returns this single error enum. Contract
//! violations by the caller and invariant-corruption failures share the enum
//! so callers can match exhaustively; [`Error::is_corruption`] distinguishes
//! the two groups for callers that want to treat corruption as fatal.

use thiserror::Error;

/// Errors raised by the polymer kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// `bind_polymerase` found no uncovered element with the requested name.
    #[error("polymerase '{walker}' could not find a free promoter '{promoter}' on polymer '{polymer}'")]
    NotFound {
        walker: String,
        promoter: String,
        polymer: String,
    },

    /// The element does not list the walker as an allowed interactor.
    #[error("polymerase '{walker}' does not interact with promoter '{promoter}'")]
    IncompatibleBinding { walker: String, promoter: String },

    /// The walker's footprint extends past the end of the element it bound to.
    #[error(
        "polymerase '{walker}' footprint is larger than that of promoter '{promoter}' it is binding to"
    )]
    FootprintTooLarge { walker: String, promoter: String },

    /// Binding would place the walker's footprint into the masked region.
    #[error("polymerase '{walker}' would overlap the mask upon binding to promoter '{promoter}'")]
    OverlapsMask { walker: String, promoter: String },

    /// The exact same walker instance is already present in this polymer's
    /// ordered list. `bind_polymerase` takes its walker by value, so under
    /// normal use this can never actually be constructed — ownership rules
    /// out presenting the same bound instance twice — but the variant is
    /// kept for API parity with the ancestor's identity check.
    #[error("polymerase '{walker}' is already bound on polymer '{polymer}'")]
    AlreadyBound { walker: String, polymer: String },

    /// `execute` was called with zero total propensity.
    #[error("attempting to execute polymer '{polymer}' with a reaction propensity of 0")]
    NoActivity { polymer: String },

    /// A `Genome::_build_transcript` call matched no template genes.
    #[error("attempting to build a transcript with no elements from genome '{genome}'")]
    EmptyTranscript { genome: String },

    /// Two features were found overlapping by more than one position, which
    /// can only happen if a caller mutated kernel state out of band.
    #[error("polymerase '{walker}' overlaps '{other}' by more than one position on polymer '{polymer}'")]
    Corruption {
        walker: String,
        other: String,
        polymer: String,
    },
}

impl Error {
    /// True for [`Error::Corruption`] and any future invariant-violation
    /// variant: these indicate a driver bug rather than a normal contract
    /// violation, and should generally be treated as fatal by the caller.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
