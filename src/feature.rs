//! Positioned intervals: [`Element`] (promoter/terminator), [`Mask`], and
//! [`Polymerase`] (the mobile walker).
//!
//! All three share the same half-open-on-neither-end overlap test, `a.stop
//! >= b.start && b.stop >= a.start`, on 1-based coordinates. `Element` is
//! the only one of the three with reference-counted covering state, since
//! it is the only one that needs to distinguish "covered by one occluder"
//! from "covered by two simultaneously" for the edge detector in
//! [`crate::polymer`].

use rustc_hash::FxHashMap;

use crate::signal::Signal;

/// True if intervals `[a_start, a_stop]` and `[b_start, b_stop]` overlap by
/// at least one position, under 1-based inclusive coordinates.
#[inline]
pub fn intervals_intersect(a_start: u64, a_stop: u64, b_start: u64, b_stop: u64) -> bool {
    a_stop >= b_start && b_stop >= a_start
}

/// Per-walker termination parameters carried by a [`Element::Terminator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminatorParams {
    /// Probability in `[0, 1]` that a given overlap resolves to termination.
    pub efficiency: f64,
    /// If set, termination is skipped unconditionally unless the walker's
    /// `reading_frame` matches this value (§4.1.5 optional refinement).
    pub reading_frame: Option<i32>,
}

impl TerminatorParams {
    pub fn new(efficiency: f64) -> Self {
        Self {
            efficiency,
            reading_frame: None,
        }
    }

    pub fn with_reading_frame(efficiency: f64, reading_frame: i32) -> Self {
        Self {
            efficiency,
            reading_frame: Some(reading_frame),
        }
    }
}

/// The promoter/terminator-specific portion of an [`Element`].
///
/// Modeled as an enum rather than a bag of optional fields: a promoter
/// carries no readthrough state and no per-walker efficiency table, a
/// terminator carries both plus the gene name it reports on termination.
#[derive(Debug, Clone)]
pub enum ElementKind {
    Promoter {
        /// Walker names allowed to bind here.
        interactions: Vec<String>,
    },
    Terminator {
        interactions: FxHashMap<String, TerminatorParams>,
        /// Name reported via `Polymerase::last_gene` on termination.
        gene: String,
        /// Sticky state recording a failed termination draw; reset only on
        /// full uncovering (§4.1.4).
        readthrough: bool,
    },
}

/// A fixed site on a polymer: a promoter or a terminator.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub start: u64,
    pub stop: u64,
    pub kind: ElementKind,
    covered: u32,
    old_covered: u32,
}

impl Element {
    /// Build a promoter. `interactions` lists walker names allowed to bind.
    pub fn promoter(
        name: impl Into<String>,
        start: u64,
        stop: u64,
        interactions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            kind: ElementKind::Promoter {
                interactions: interactions.into_iter().collect(),
            },
            covered: 0,
            old_covered: 0,
        }
    }

    /// Build a terminator. `gene` is what `Polymerase::last_gene` is set to
    /// on a successful termination here.
    pub fn terminator(
        name: impl Into<String>,
        start: u64,
        stop: u64,
        interactions: FxHashMap<String, TerminatorParams>,
        gene: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            kind: ElementKind::Terminator {
                interactions,
                gene: gene.into(),
                readthrough: false,
            },
            covered: 0,
            old_covered: 0,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, ElementKind::Terminator { .. })
    }

    /// True if `walker_name` is listed in this element's interaction table.
    pub fn interacts_with(&self, walker_name: &str) -> bool {
        match &self.kind {
            ElementKind::Promoter { interactions } => {
                interactions.iter().any(|n| n == walker_name)
            }
            ElementKind::Terminator { interactions, .. } => interactions.contains_key(walker_name),
        }
    }

    /// Termination parameters for `walker_name`, if this is a terminator
    /// that interacts with it.
    pub fn terminator_params(&self, walker_name: &str) -> Option<&TerminatorParams> {
        match &self.kind {
            ElementKind::Terminator { interactions, .. } => interactions.get(walker_name),
            ElementKind::Promoter { .. } => None,
        }
    }

    /// The gene name this terminator reports, if it is one.
    pub fn gene(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Terminator { gene, .. } => Some(gene),
            ElementKind::Promoter { .. } => None,
        }
    }

    pub fn readthrough(&self) -> bool {
        match &self.kind {
            ElementKind::Terminator { readthrough, .. } => *readthrough,
            ElementKind::Promoter { .. } => false,
        }
    }

    pub fn set_readthrough(&mut self, value: bool) {
        if let ElementKind::Terminator { readthrough, .. } = &mut self.kind {
            *readthrough = value;
        }
    }

    #[inline]
    pub fn intersects(&self, start: u64, stop: u64) -> bool {
        intervals_intersect(self.start, self.stop, start, stop)
    }

    pub fn is_covered(&self) -> bool {
        self.covered > 0
    }

    pub fn covered(&self) -> u32 {
        self.covered
    }

    /// Increment the occlusion reference count.
    pub fn cover(&mut self) {
        self.covered += 1;
    }

    /// Decrement the occlusion reference count, saturating at 0.
    pub fn uncover(&mut self) {
        self.covered = self.covered.saturating_sub(1);
    }

    /// Snapshot `covered` into `old_covered` for the edge detector.
    pub fn save_state(&mut self) {
        self.old_covered = self.covered;
    }

    /// `true` iff this element transitioned from uncovered to covered since
    /// the last `save_state`.
    pub fn was_covered(&self) -> bool {
        self.old_covered == 0 && self.covered >= 1
    }

    /// `true` iff this element transitioned from covered to fully uncovered
    /// since the last `save_state`.
    pub fn was_uncovered(&self) -> bool {
        self.old_covered >= 1 && self.covered == 0
    }
}

/// The mobile, currently-inaccessible suffix of a polymer.
///
/// Modeled separately from [`Element`] (matching the ancestor
/// implementation's own `Mask` class) rather than as another `ElementKind`
/// variant: the mask has no covering state of its own — it is the occluder,
/// never the occluded — and its whitelist gates which walkers may push it
/// back, which no `Element` needs.
#[derive(Debug, Clone)]
pub struct Mask {
    pub name: String,
    pub start: u64,
    pub stop: u64,
    interactions: Vec<String>,
}

impl Mask {
    pub fn new(
        name: impl Into<String>,
        start: u64,
        stop: u64,
        interactions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            interactions: interactions.into_iter().collect(),
        }
    }

    #[inline]
    pub fn intersects(&self, start: u64, stop: u64) -> bool {
        intervals_intersect(self.start, self.stop, start, stop)
    }

    /// `true` if `walker_name` is allowed to push this mask back.
    pub fn interacts_with(&self, walker_name: &str) -> bool {
        self.interactions.iter().any(|n| n == walker_name)
    }

    /// Advance `start` by one position, never past `stop`.
    pub fn recede(&mut self) {
        if self.start < self.stop {
            self.start += 1;
        }
    }

    /// `true` once the mask has receded all the way to its own stop.
    pub fn is_exhausted(&self) -> bool {
        self.start == self.stop
    }
}

/// A mobile walker (RNA polymerase, ribosome, ...).
pub struct Polymerase {
    pub name: String,
    pub speed: f64,
    pub footprint: u64,
    pub start: u64,
    pub stop: u64,
    pub attached: bool,
    pub last_gene: Option<String>,
    /// Small integer tag used by the optional reading-frame termination
    /// predicate (§4.1.5). `None` means the predicate is not checked.
    pub reading_frame: Option<i32>,
    /// Fires after a successful, uncollided move. A `Genome`-constructed
    /// `Transcript` subscribes to its parent walker's copy of this signal
    /// to learn when to expose newly-synthesized territory.
    pub move_signal: Signal<()>,
    /// Fires with this walker's final `stop` position when it detaches. A
    /// child `Transcript` subscribes to jump its mask forward to match.
    pub termination_signal: Signal<u64>,
}

impl Polymerase {
    /// Construct an unbound walker. `start`/`stop` are meaningless until
    /// `bind_polymerase` places it on a polymer.
    pub fn new(name: impl Into<String>, speed: f64, footprint: u64) -> Self {
        Self {
            name: name.into(),
            speed,
            footprint,
            start: 0,
            stop: 0,
            attached: true,
            last_gene: None,
            reading_frame: None,
            move_signal: Signal::new(),
            termination_signal: Signal::new(),
        }
    }

    pub fn with_reading_frame(mut self, frame: i32) -> Self {
        self.reading_frame = Some(frame);
        self
    }

    #[inline]
    pub fn intersects(&self, start: u64, stop: u64) -> bool {
        intervals_intersect(self.start, self.stop, start, stop)
    }

    /// Advance both endpoints by one position. Named `advance`/`retreat`
    /// rather than the ancestor's `move`/`move_back`: `move` is a reserved
    /// keyword in Rust.
    pub fn advance(&mut self) {
        self.start += 1;
        self.stop += 1;
    }

    /// Roll both endpoints back by one position.
    pub fn retreat(&mut self) {
        self.start -= 1;
        self.stop -= 1;
    }
}

impl std::fmt::Debug for Polymerase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Polymerase")
            .field("name", &self.name)
            .field("speed", &self.speed)
            .field("footprint", &self.footprint)
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("attached", &self.attached)
            .field("last_gene", &self.last_gene)
            .field("reading_frame", &self.reading_frame)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_intersect() {
        assert!(intervals_intersect(5, 10, 10, 20));
        assert!(intervals_intersect(5, 10, 1, 5));
        assert!(!intervals_intersect(5, 10, 11, 20));
        assert!(!intervals_intersect(11, 20, 5, 10));
    }

    #[test]
    fn test_cover_uncover_saturates_at_zero() {
        let mut e = Element::promoter("p1", 5, 15, vec!["rnapol".to_string()]);
        e.uncover();
        assert_eq!(e.covered(), 0);
        e.cover();
        e.cover();
        assert_eq!(e.covered(), 2);
        e.uncover();
        e.uncover();
        e.uncover();
        assert_eq!(e.covered(), 0);
    }

    #[test]
    fn test_was_covered_and_was_uncovered_edges() {
        let mut e = Element::promoter("p1", 5, 15, vec!["rnapol".to_string()]);
        e.save_state();
        assert!(!e.was_covered());
        assert!(!e.was_uncovered());

        e.cover();
        assert!(e.was_covered());
        assert!(!e.was_uncovered());
        e.save_state();

        e.uncover();
        assert!(!e.was_covered());
        assert!(e.was_uncovered());
    }

    #[test]
    fn test_terminator_readthrough_resets_only_on_full_uncover() {
        let mut params = FxHashMap::default();
        params.insert("rnapol".to_string(), TerminatorParams::new(0.6));
        let mut t = Element::terminator("term1", 50, 55, params, "geneA");

        t.set_readthrough(true);
        t.cover();
        t.cover();
        t.save_state();
        t.uncover();
        // still covered once (old_covered=2 -> covered=1): not "was_uncovered"
        assert!(!t.was_uncovered());
        assert!(t.readthrough());

        t.save_state();
        t.uncover();
        assert!(t.was_uncovered());
    }

    #[test]
    fn test_mask_recede_never_passes_stop() {
        let mut m = Mask::new("mask", 10, 12, vec!["ecolipol".to_string()]);
        m.recede();
        assert_eq!(m.start, 11);
        m.recede();
        assert_eq!(m.start, 12);
        m.recede();
        assert_eq!(m.start, 12);
        assert!(m.is_exhausted());
    }

    #[test]
    fn test_mask_interactions_whitelist() {
        let m = Mask::new("mask", 10, 100, vec!["ecolipol".to_string()]);
        assert!(m.interacts_with("ecolipol"));
        assert!(!m.interacts_with("rnapol"));
    }

    #[test]
    fn test_polymerase_advance_and_retreat() {
        let mut pol = Polymerase::new("rnapol", 30.0, 10);
        pol.start = 5;
        pol.stop = 14;
        pol.advance();
        assert_eq!((pol.start, pol.stop), (6, 15));
        pol.retreat();
        assert_eq!((pol.start, pol.stop), (5, 14));
    }
}
