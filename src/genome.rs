//! `Genome`: a [`crate::polymer::Polymer`] that builds a child
//! [`crate::transcript::Transcript`] every time a walker binds.
//!
//! This is the first of the two extension points noted in §9: a post-bind
//! hook. Rather than overriding a virtual method on a shared base class,
//! `Genome` wraps the same [`PolymerCore`] the plain `Polymer` wraps and
//! layers transcript construction on top of the one call whose behavior
//! actually differs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::feature::{Element, Mask, Polymerase, TerminatorParams};
use crate::polymer::{PolymerCore, WalkerId};
use crate::signal::Signal;
use crate::transcript::Transcript;

/// One entry of the caller-supplied transcript template: the largest
/// possible polycistronic transcript this genome can produce.
#[derive(Debug, Clone)]
pub struct GeneTemplate {
    pub name: String,
    pub start: u64,
    pub stop: u64,
    /// Offset upstream of `start` at which the ribosome binding site opens.
    pub rbs: u64,
    /// Carried through from the caller's descriptor; unused by
    /// `_build_transcript` itself but part of the external contract (§6).
    pub length: u64,
}

impl GeneTemplate {
    pub fn new(name: impl Into<String>, start: u64, stop: u64, rbs: u64, length: u64) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            rbs,
            length,
        }
    }
}

/// DNA: tracks RNA polymerases, builds a `Transcript` on every bind.
pub struct Genome {
    core: PolymerCore,
    transcript_template: Vec<GeneTemplate>,
    ribosome_efficiency: f64,
    pub transcript_signal: Signal<Rc<RefCell<Transcript>>>,
}

impl Genome {
    pub fn new(
        name: impl Into<String>,
        length: u64,
        elements: Vec<Element>,
        mask: Mask,
        transcript_template: Vec<GeneTemplate>,
        seed: u64,
    ) -> Self {
        Self {
            core: PolymerCore::new(name, length, elements, mask, seed),
            transcript_template,
            ribosome_efficiency: 1.0,
            transcript_signal: Signal::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn length(&self) -> u64 {
        self.core.length
    }

    /// Bind `walker`, then construct a `Transcript` spanning
    /// `[walker.start, genome.length]` and wire the walker's per-walker
    /// signals to it (§4.2).
    pub fn bind_polymerase(&mut self, walker: Polymerase, promoter_name: &str) -> Result<WalkerId> {
        let id = self.core.bind_polymerase(walker, promoter_name)?;
        let bound = self
            .core
            .walker(id)
            .expect("just-bound walker must be present");
        let start = bound.start;

        let transcript = Rc::new(RefCell::new(self.build_transcript(start, self.core.length)?));

        // Re-borrow the walker mutably to wire its signals; `build_transcript`
        // only needed `start`/`length`, both already captured above.
        self.connect_walker_to_transcript(id, transcript.clone())?;

        tracing::debug!(genome = %self.core.name, transcript_start = start, transcript_stop = self.core.length, "built transcript");
        self.transcript_signal.fire(transcript);
        Ok(id)
    }

    fn connect_walker_to_transcript(&mut self, id: WalkerId, transcript: Rc<RefCell<Transcript>>) -> Result<()> {
        let walker = self.core.walker_mut(id).ok_or_else(|| Error::NotFound {
            walker: String::new(),
            promoter: String::new(),
            polymer: self.core.name.clone(),
        })?;

        let on_move = transcript.clone();
        walker.move_signal.connect(move |_| {
            on_move.borrow_mut().shift_mask();
        });

        let on_terminate = transcript;
        walker.termination_signal.connect(move |stop| {
            on_terminate.borrow_mut().release(stop);
        });

        Ok(())
    }

    pub fn execute(&mut self) -> Result<()> {
        self.core.execute()
    }

    pub fn shift_mask(&mut self) {
        self.core.shift_mask()
    }

    /// Terminate `id`, then additionally fire the base `termination_signal`
    /// with just the walker's name (§4.2; grounded in
    /// `original_source/pysinthe/polymer.py::Genome.terminate`, which fires
    /// its own `termination_signal(pol.name)` on top of whatever the base
    /// `Polymer.terminate` already does).
    pub fn terminate(&mut self, id: WalkerId) -> Result<()> {
        let name = self.core.walker(id).map(|w| w.name.clone());
        self.core.terminate(id)?;
        if let Some(name) = name {
            self.core.termination_signal.fire((name, None));
        }
        Ok(())
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

    pub fn mask(&self) -> &crate::feature::Mask {
        self.core.mask()
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

    /// §4.2 `_build_transcript`: promoter/terminator pairs for every
    /// template gene fully contained in `[start, stop]`.
    fn build_transcript(&self, start: u64, stop: u64) -> Result<Transcript> {
        let mut elements = Vec::new();
        for gene in &self.transcript_template {
            if gene.start >= start && gene.stop <= stop {
                let rbs = Element::promoter("rbs", gene.start - gene.rbs, gene.start, vec!["ribosome".to_string()]);
                let mut params = FxHashMap::default();
                params.insert("ribosome".to_string(), TerminatorParams::new(self.ribosome_efficiency));
                // §2.1 supplement: a deliberate 2-bp span, matching
                // original_source/pysinthe/polymer.py's `_build_transcript`.
                let tstop = Element::terminator("tstop", gene.stop - 1, gene.stop, params, gene.name.clone());
                elements.push(rbs);
                elements.push(tstop);
            }
        }
        if elements.is_empty() {
            return Err(Error::EmptyTranscript {
                genome: self.core.name.clone(),
            });
        }
        Ok(Transcript::new("rna", self.core.length, elements, Mask::new("mask", start, stop, Vec::<String>::new())))
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.core, f)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::feature::{Element, Mask, Polymerase};

    use super::*;

    #[test]
    fn test_terminate_fires_termination_signal_twice() {
        // Grounded in original_source/pysinthe/polymer.py::Genome.terminate,
        // which calls `super().terminate(pol)` (firing the base
        // `termination_signal`) and then fires its own
        // `termination_signal(pol.name)` again on top of it.
        let promoter = Element::promoter("p1", 0, 40, vec!["rnap".to_string()]);
        let mask = Mask::new("mask", 90, 100, Vec::<String>::new());
        let gene = GeneTemplate::new("geneA", 0, 100, 0, 100);
        let mut genome = Genome::new("g", 100, vec![promoter], mask, vec![gene], 1);

        let fired = Rc::new(RefCell::new(Vec::new()));
        let recorder = fired.clone();
        genome.connect_termination_signal(move |event| recorder.borrow_mut().push(event));

        let rnap = Polymerase::new("rnap", 30.0, 35);
        let id = genome.bind_polymerase(rnap, "p1").unwrap();
        genome.terminate(id).unwrap();

        let fired = fired.borrow();
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].0, "rnap");
        assert_eq!(fired[1], ("rnap".to_string(), None));
    }

    #[test]
    fn test_display_delegates_to_core() {
        let promoter = Element::promoter("p1", 0, 40, vec!["rnap".to_string()]);
        let mask = Mask::new("mask", 90, 100, Vec::<String>::new());
        let gene = GeneTemplate::new("geneA", 0, 100, 0, 100);
        let genome = Genome::new("g", 100, vec![promoter], mask, vec![gene], 1);
        let rendered = genome.to_string();
        assert!(rendered.starts_with("g:\n"));
        assert_eq!(rendered.trim_start_matches("g:\n").len(), genome.length() as usize);
    }
}
