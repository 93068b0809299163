//! `Transcript`: an mRNA whose accessible region expands as its parent
//! walker (an RNA polymerase on a `Genome`) moves.
//!
//! This is the second extension point noted in §9. A `Transcript` wraps the
//! same [`PolymerCore`] mechanics as `Polymer`/`Genome`; it differs only in
//! how its mask is driven — not by `shift_mask` being called directly by an
//! external scheduler, but by the parent walker's `move_signal`/
//! `termination_signal`, wired up in `Genome::bind_polymerase`.

use std::fmt;

use crate::error::Result;
use crate::feature::{Element, Mask, Polymerase};
use crate::polymer::{PolymerCore, WalkerId};

/// An mRNA transcript: tracks ribosomes and, eventually, protein output.
pub struct Transcript {
    core: PolymerCore,
}

impl Transcript {
    pub fn new(name: impl Into<String>, length: u64, elements: Vec<Element>, mask: Mask) -> Self {
        // The transcript's own randomness (readthrough draws for any
        // terminators on the transcript, e.g. a ribosomal stop codon) is
        // independent of its parent genome's; deriving the seed from the
        // mask bounds keeps it reproducible without threading an extra
        // argument through `Genome::_build_transcript`.
        let seed = mask.start ^ (mask.stop << 32);
        Self {
            core: PolymerCore::new(name, length, elements, mask, seed),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn length(&self) -> u64 {
        self.core.length
    }

    pub fn bind_polymerase(&mut self, walker: Polymerase, promoter_name: &str) -> Result<WalkerId> {
        self.core.bind_polymerase(walker, promoter_name)
    }

    pub fn execute(&mut self) -> Result<()> {
        self.core.execute()
    }

    /// Advance the mask by exactly one base pair (§4.1.6). Called directly
    /// by an external scheduler, or indirectly via the parent walker's
    /// `move_signal` once this transcript is wired up by `Genome`.
    pub fn shift_mask(&mut self) {
        self.core.shift_mask()
    }

    /// Jump the mask directly to `stop` (§2.1 supplement, grounded in
    /// `original_source/pysinthe/polymer.py`'s `Transcript.release`).
    ///
    /// Used when the parent walker detaches before reaching the genome's
    /// end: `shift_mask`'s one-base-pair-per-call contract would require
    /// `stop - mask.start` separate calls to catch the transcript's
    /// accessible region up to where transcription actually stopped.
    /// Instead this advances the mask directly and reconciles covering for
    /// every element the jump passes over, not just the first — a jump of
    /// more than one base pair can cross several elements at once, unlike
    /// `shift_mask`'s single-element restriction which only holds for 1bp
    /// steps.
    pub fn release(&mut self, stop: u64) {
        while self.core.mask().start < stop && !self.core.mask().is_exhausted() {
            self.core.shift_mask();
        }
    }

    pub fn terminate(&mut self, id: WalkerId) -> Result<()> {
        self.core.terminate(id)
    }

    pub fn count_uncovered(&self, name: &str) -> i64 {
        self.core.count_uncovered(name)
    }

    pub fn calculate_propensity(&self) -> f64 {
        self.core.calculate_propensity()
    }

    pub fn walker(&self, id: WalkerId) -> Option<&Polymerase> {
        self.core.walker(id)
    }

    pub fn mask(&self) -> &Mask {
        self.core.mask()
    }

    pub fn elements(&self) -> &[Element] {
        self.core.elements()
    }

    pub fn connect_promoter_signal<F: FnMut(String) + 'static>(&mut self, handler: F) {
        self.core.promoter_signal.connect(handler);
    }

    pub fn connect_block_signal<F: FnMut(String) + 'static>(&mut self, handler: F) {
        self.core.block_signal.connect(handler);
    }

    pub fn connect_termination_signal<F: FnMut((String, Option<String>)) + 'static>(&mut self, handler: F) {
        self.core.termination_signal.connect(handler);
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.core, f)
    }
}
