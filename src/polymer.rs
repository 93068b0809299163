//! The polymer kernel: binding, the ordered walker list, collision
//! resolution, element covering, and termination.
//!
//! [`PolymerCore`] holds every field and implements every operation exactly
//! once; [`Polymer`] is a thin wrapper exposing it directly, while
//! [`crate::genome::Genome`] and [`crate::transcript::Transcript`] wrap the
//! same core and add their own extension points (§9: composition over a
//! deep class hierarchy). A walker is addressed from the outside by
//! [`WalkerId`], a small integer handle assigned at bind time — the ordered
//! list itself is free to shuffle a walker's index as neighbors bind and
//! terminate.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use std::fmt;

use crate::choice;
use crate::config;
use crate::error::{Error, Result};
use crate::feature::{intervals_intersect, Element, Mask, Polymerase};
use crate::signal::Signal;

/// Opaque handle to a bound walker, assigned by `bind_polymerase` and valid
/// until the walker terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalkerId(u64);

/// Shared kernel mechanics used by `Polymer`, `Genome`, and `Transcript`.
pub(crate) struct PolymerCore {
    pub name: String,
    pub length: u64,
    walkers: Vec<Polymerase>,
    /// Mirrors `walkers[i].speed`; kept as a separate vector so the
    /// propensity-weighted draw in `execute` doesn't need to re-read it off
    /// each `Polymerase` on every call (invariant 3, §3).
    prop_list: Vec<f64>,
    /// Handle assigned at bind time, parallel to `walkers`/`prop_list`.
    ids: Vec<u64>,
    next_id: u64,
    prop_sum: f64,
    elements: Vec<Element>,
    mask: Mask,
    uncovered: FxHashMap<String, i64>,
    rng: SmallRng,
    pub termination_signal: Signal<(String, Option<String>)>,
    pub promoter_signal: Signal<String>,
    pub block_signal: Signal<String>,
    pub propensity_signal: Signal<()>,
}

impl PolymerCore {
    pub fn new(name: impl Into<String>, length: u64, elements: Vec<Element>, mask: Mask, seed: u64) -> Self {
        let name = name.into();
        let mut uncovered = FxHashMap::default();
        for element in &elements {
            uncovered.entry(element.name.clone()).or_insert(0);
        }

        let mut core = Self {
            name,
            length,
            walkers: Vec::new(),
            prop_list: Vec::new(),
            ids: Vec::new(),
            next_id: 0,
            prop_sum: 0.0,
            elements,
            mask,
            uncovered,
            rng: SmallRng::seed_from_u64(seed),
            termination_signal: Signal::new(),
            promoter_signal: Signal::new(),
            block_signal: Signal::new(),
            propensity_signal: Signal::new(),
        };

        let (mask_start, mask_stop) = (core.mask.start, core.mask.stop);
        for element in core.elements.iter_mut() {
            if element.intersects(mask_start, mask_stop) {
                element.cover();
            } else if !element.is_terminator() {
                *core.uncovered.get_mut(&element.name).unwrap() += 1;
            }
        }
        core
    }

    pub fn bind_polymerase(&mut self, mut walker: Polymerase, promoter_name: &str) -> Result<WalkerId> {
        let elem_idx = self
            .elements
            .iter()
            .position(|e| e.name == promoter_name && !e.is_covered())
            .ok_or_else(|| Error::NotFound {
                walker: walker.name.clone(),
                promoter: promoter_name.to_string(),
                polymer: self.name.clone(),
            })?;

        if !self.elements[elem_idx].interacts_with(&walker.name) {
            return Err(Error::IncompatibleBinding {
                walker: walker.name.clone(),
                promoter: promoter_name.to_string(),
            });
        }

        walker.start = self.elements[elem_idx].start;
        walker.stop = walker.start + walker.footprint - 1;

        if walker.stop > self.elements[elem_idx].stop {
            return Err(Error::FootprintTooLarge {
                walker: walker.name.clone(),
                promoter: promoter_name.to_string(),
            });
        }
        if walker.stop >= self.mask.start {
            return Err(Error::OverlapsMask {
                walker: walker.name.clone(),
                promoter: promoter_name.to_string(),
            });
        }
        // No by-name "already bound" check here: the ancestor implementation
        // rejects re-inserting the same polymerase *object*
        // (`original_source/pysinthe/polymer.py::_insert_polymerase`, `if pol
        // in self.polymerases`), not the same species name — two distinct
        // walkers sharing a name legitimately coexist on one polymer
        // (`original_source/tests/test_polymer.py::test_execute`, `pol2`/
        // `pol3` both named `"rnapol"`). Rust's ownership already prevents
        // the case the ancestor actually guards against: `walker` is moved
        // in by value, so the same bound instance can never reach this
        // function twice.
        self.elements[elem_idx].cover();
        self.elements[elem_idx].save_state();
        let name = self.elements[elem_idx].name.clone();
        *self.uncovered.get_mut(&name).unwrap() -= 1;

        let insert_at = self
            .walkers
            .iter()
            .position(|w| w.start > walker.start)
            .unwrap_or(self.walkers.len());
        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!(
            polymer = %self.name,
            walker = %walker.name,
            promoter = promoter_name,
            start = walker.start,
            stop = walker.stop,
            "bound polymerase"
        );

        self.prop_sum += walker.speed;
        self.prop_list.insert(insert_at, walker.speed);
        self.ids.insert(insert_at, id);
        self.walkers.insert(insert_at, walker);
        self.propensity_signal.fire(());
        Ok(WalkerId(id))
    }

    pub fn execute(&mut self) -> Result<()> {
        if self.prop_sum <= 0.0 {
            return Err(Error::NoActivity {
                polymer: self.name.clone(),
            });
        }
        let idx = choice::weighted_index(&mut self.rng, &self.prop_list).ok_or_else(|| Error::NoActivity {
            polymer: self.name.clone(),
        })?;
        tracing::trace!(polymer = %self.name, walker = %self.walkers[idx].name, "chosen to move");
        self.move_polymerase(idx)
    }

    pub fn shift_mask(&mut self) {
        if self.mask.is_exhausted() {
            return;
        }
        let touched = self
            .elements
            .iter()
            .position(|e| e.intersects(self.mask.start, self.mask.stop));

        if let Some(idx) = touched {
            self.elements[idx].save_state();
            self.elements[idx].uncover();
        }

        self.mask.recede();
        tracing::trace!(polymer = %self.name, mask_start = self.mask.start, "mask shifted");

        if let Some(idx) = touched {
            if self.elements[idx].intersects(self.mask.start, self.mask.stop) {
                self.elements[idx].cover();
            }
            let Self {
                elements,
                uncovered,
                promoter_signal,
                block_signal,
                ..
            } = self;
            Self::check_state_fields(&mut elements[idx], uncovered, promoter_signal, block_signal);
        }
    }

    /// Remove the walker at handle `id`. Fires the walker's own
    /// `termination_signal` (carrying its final `stop` position, used by a
    /// `Genome`-built `Transcript` to catch its mask up) followed by the
    /// polymer-level `propensity_signal` and `termination_signal`.
    pub fn terminate(&mut self, id: WalkerId) -> Result<()> {
        let idx = self.index_of(id)?;
        self.terminate_at(idx)
    }

    fn terminate_at(&mut self, idx: usize) -> Result<()> {
        self.ids.remove(idx);
        self.prop_list.remove(idx);
        let mut walker = self.walkers.remove(idx);
        self.prop_sum -= walker.speed;

        tracing::debug!(
            polymer = %self.name,
            walker = %walker.name,
            gene = ?walker.last_gene,
            "terminated polymerase"
        );

        self.propensity_signal.fire(());
        walker.termination_signal.fire(walker.stop);
        self.termination_signal
            .fire((walker.name.clone(), walker.last_gene.clone()));
        Ok(())
    }

    pub fn count_uncovered(&self, name: &str) -> i64 {
        self.uncovered.get(name).copied().unwrap_or(0)
    }

    pub fn calculate_propensity(&self) -> f64 {
        self.prop_sum
    }

    pub fn walker(&self, id: WalkerId) -> Option<&Polymerase> {
        self.index_of(id).ok().map(|idx| &self.walkers[idx])
    }

    /// Mutable access to a bound walker's own signals, used by `Genome` to
    /// wire a freshly built `Transcript` to its parent's movement.
    pub fn walker_mut(&mut self, id: WalkerId) -> Option<&mut Polymerase> {
        let idx = self.index_of(id).ok()?;
        Some(&mut self.walkers[idx])
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn walkers(&self) -> &[Polymerase] {
        &self.walkers
    }

    fn index_of(&self, id: WalkerId) -> Result<usize> {
        self.ids.iter().position(|&x| x == id.0).ok_or_else(|| Error::NotFound {
            walker: format!("<handle {}>", id.0),
            promoter: String::new(),
            polymer: self.name.clone(),
        })
    }

    /// §4.1.3 — the heart of the kernel.
    fn move_polymerase(&mut self, idx: usize) -> Result<()> {
        let (w_start, w_stop) = (self.walkers[idx].start, self.walkers[idx].stop);
        let (m_start, m_stop) = (self.mask.start, self.mask.stop);

        // 1. save-and-uncover: an element intersecting both the walker and
        // the mask is uncovered twice, exactly matching the ancestor
        // implementation's two independent (not `else if`) checks.
        for element in self.elements.iter_mut() {
            if element.intersects(w_start, w_stop) {
                element.save_state();
                element.uncover();
            }
            if element.intersects(m_start, m_stop) {
                element.save_state();
                element.uncover();
            }
        }

        // 2. advance
        self.walkers[idx].advance();

        // 3. collision with the next walker downstream
        let mut pol_collision = false;
        if idx + 1 < self.walkers.len() {
            let (new_start, new_stop) = (self.walkers[idx].start, self.walkers[idx].stop);
            let (next_start, next_stop) = (self.walkers[idx + 1].start, self.walkers[idx + 1].stop);
            if intervals_intersect(new_start, new_stop, next_start, next_stop) {
                let overlap = overlap_len(new_start, new_stop, next_start, next_stop);
                if overlap > 1 {
                    tracing::error!(
                        polymer = %self.name,
                        walker = %self.walkers[idx].name,
                        other = %self.walkers[idx + 1].name,
                        overlap,
                        "polymerase overlap exceeds one position"
                    );
                    if !config::is_permissive_corruption() {
                        return Err(Error::Corruption {
                            walker: self.walkers[idx].name.clone(),
                            other: self.walkers[idx + 1].name.clone(),
                            polymer: self.name.clone(),
                        });
                    }
                }
                self.walkers[idx].retreat();
                pol_collision = true;
            }
        }

        // 4. collision with the mask
        let mut mask_collision = false;
        let (new_start, new_stop) = (self.walkers[idx].start, self.walkers[idx].stop);
        if self.mask.intersects(new_start, new_stop) {
            let overlap = overlap_len(new_start, new_stop, self.mask.start, self.mask.stop);
            if overlap > 1 {
                tracing::error!(
                    polymer = %self.name,
                    walker = %self.walkers[idx].name,
                    overlap,
                    "polymerase/mask overlap exceeds one position"
                );
                if !config::is_permissive_corruption() {
                    return Err(Error::Corruption {
                        walker: self.walkers[idx].name.clone(),
                        other: self.mask.name.clone(),
                        polymer: self.name.clone(),
                    });
                }
            }
            if self.mask.interacts_with(&self.walkers[idx].name) {
                self.mask.recede();
            } else {
                self.walkers[idx].retreat();
                mask_collision = true;
            }
        }

        // 5. fire move, only if the step landed cleanly
        if !pol_collision && !mask_collision {
            self.walkers[idx].move_signal.fire(());
        }

        // 6. recover and react
        let (w_start, w_stop) = (self.walkers[idx].start, self.walkers[idx].stop);
        let (m_start, m_stop) = (self.mask.start, self.mask.stop);
        let walker_name = self.walkers[idx].name.clone();
        let mut terminate_now = false;

        for element in self.elements.iter_mut() {
            if element.intersects(m_start, m_stop) {
                element.cover();
                Self::check_state_fields(element, &mut self.uncovered, &mut self.promoter_signal, &mut self.block_signal);
            }
            if element.intersects(w_start, w_stop) {
                element.cover();
                if element.is_terminator()
                    && element.interacts_with(&walker_name)
                    && resolve_termination(element, &mut self.walkers[idx], &mut self.rng)
                {
                    terminate_now = true;
                }
            }
            Self::check_state_fields(element, &mut self.uncovered, &mut self.promoter_signal, &mut self.block_signal);
        }

        if terminate_now {
            self.terminate_at(idx)?;
        }

        Ok(())
    }

    /// §4.1.4 edge detector: fires `block_signal`/`promoter_signal` on a
    /// covered/uncovered transition since the last `save_state`.
    fn check_state_fields(
        element: &mut Element,
        uncovered: &mut FxHashMap<String, i64>,
        promoter_signal: &mut Signal<String>,
        block_signal: &mut Signal<String>,
    ) {
        if element.was_covered() && !element.is_terminator() {
            *uncovered.get_mut(&element.name).unwrap() -= 1;
            block_signal.fire(element.name.clone());
            element.save_state();
        }
        if element.was_uncovered() {
            element.save_state();
            if element.is_terminator() {
                element.set_readthrough(false);
            } else {
                *uncovered.get_mut(&element.name).unwrap() += 1;
                promoter_signal.fire(element.name.clone());
            }
        }
    }
}

#[inline]
fn overlap_len(a_start: u64, a_stop: u64, b_start: u64, b_stop: u64) -> u64 {
    let lo = a_start.max(b_start);
    let hi = a_stop.min(b_stop);
    hi.saturating_sub(lo) + 1
}

/// §4.1.5 termination resolution. Returns `true` if `walker` should now be
/// detached from the polymer.
fn resolve_termination(element: &mut Element, walker: &mut Polymerase, rng: &mut SmallRng) -> bool {
    if element.readthrough() {
        return false;
    }
    let Some(params) = element.terminator_params(&walker.name).copied() else {
        return false;
    };
    if let (Some(elem_frame), Some(walker_frame)) = (params.reading_frame, walker.reading_frame) {
        if elem_frame != walker_frame {
            return false;
        }
    }
    let draw = choice::uniform(rng);
    if draw > params.efficiency {
        element.set_readthrough(true);
        false
    } else {
        walker.attached = false;
        walker.last_gene = element.gene().map(|g| g.to_string());
        true
    }
}

impl fmt::Display for PolymerCore {
    /// Diagnostic one-line-per-polymer track: `o` for accessible territory,
    /// `x` for the masked suffix, and a walker's ordinal index over its
    /// footprint. Read-only; never touched by the simulation itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.length as usize;
        let mut track = vec!['o'; len];
        for pos in self.mask.start..=self.mask.stop {
            if pos >= 1 && (pos as usize) <= len {
                track[pos as usize - 1] = 'x';
            }
        }
        for (i, walker) in self.walkers.iter().enumerate() {
            let tag = char::from_digit((i % 10) as u32, 10).unwrap_or('#');
            for pos in walker.start..=walker.stop {
                if pos >= 1 && (pos as usize) <= len {
                    track[pos as usize - 1] = tag;
                }
            }
        }
        writeln!(f, "{}:", self.name)?;
        for c in track {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A polymer: an ordered walker list, fixed elements, and a mask.
///
/// This is the base capability described in §4.1; `Genome` and `Transcript`
/// wrap the same [`PolymerCore`] mechanics and add their own extension
/// points rather than subclassing it.
pub struct Polymer {
    pub(crate) core: PolymerCore,
}

impl Polymer {
    pub fn new(name: impl Into<String>, length: u64, elements: Vec<Element>, mask: Mask, seed: u64) -> Self {
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

    pub fn shift_mask(&mut self) {
        self.core.shift_mask()
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

    pub fn walkers(&self) -> &[Polymerase] {
        self.core.walkers()
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

    pub fn connect_propensity_signal<F: FnMut(()) + 'static>(&mut self, handler: F) {
        self.core.propensity_signal.connect(handler);
    }
}

impl fmt::Display for Polymer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.core, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::TerminatorParams;
    use rustc_hash::FxHashMap as Map;

    fn blocked_promoter_polymer() -> Polymer {
        let promoter = Element::promoter("p1", 5, 15, vec!["w".to_string()]);
        let mask = Mask::new("mask", 10, 100, Vec::<String>::new());
        Polymer::new("poly", 100, vec![promoter], mask, 22)
    }

    #[test]
    fn test_scenario_1_blocked_promoter() {
        let mut poly = blocked_promoter_polymer();
        let w = Polymerase::new("w", 30.0, 10);
        let err = poly.bind_polymerase(w, "p1").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        for _ in 0..10 {
            poly.shift_mask();
        }

        let w = Polymerase::new("w", 30.0, 10);
        let id = poly.bind_polymerase(w, "p1").unwrap();
        let bound = poly.walker(id).unwrap();
        assert_eq!(bound.start, 5);
        assert_eq!(bound.stop, 14);
        assert_eq!(poly.count_uncovered("p1"), 0);
        assert_eq!(poly.calculate_propensity(), 30.0);
    }

    #[test]
    fn test_scenario_2_collision() {
        // Mask kept far downstream (grounded in
        // original_source/tests/test_polymer.py::test_execute, which places
        // its mask stop well past where either walker ever travels) so only
        // the walker-walker collision this scenario is about can occur; a
        // mask close behind the promoter would jam w1 against it before w2
        // ever binds. Moves are driven directly through the private
        // `move_polymerase`, matching the ancestor test's direct
        // `_move_polymerase(pol)` calls, since `execute()`'s propensity-
        // weighted choice would otherwise pick between w1 and w2 at random
        // once both are bound.
        let p1 = Element::promoter("p1", 5, 15, vec!["w".to_string()]);
        let mask = Mask::new("mask", 150, 200, Vec::<String>::new());
        let mut poly = Polymer::new("poly", 200, vec![p1], mask, 1);

        let w1 = Polymerase::new("w", 30.0, 10);
        let id1 = poly.bind_polymerase(w1, "p1").unwrap();
        let idx1 = poly.core.index_of(id1).unwrap();
        for _ in 0..20 {
            poly.core.move_polymerase(idx1).unwrap();
        }

        let w2 = Polymerase::new("w", 30.0, 10);
        let id2 = poly.bind_polymerase(w2, "p1").unwrap();
        let idx2 = poly.core.index_of(id2).unwrap();
        for _ in 0..11 {
            poly.core.move_polymerase(idx2).unwrap();
        }

        let stop2 = poly.walker(id2).unwrap().stop;
        let start1 = poly.walker(id1).unwrap().start;
        assert_eq!(stop2 + 1, start1);
        assert!(!poly.walker(id2).unwrap().intersects(start1, poly.walker(id1).unwrap().stop));
    }

    #[test]
    fn test_scenario_3_termination() {
        let mut params = Map::default();
        params.insert("w".to_string(), TerminatorParams::new(1.0));
        let promoter = Element::promoter("p1", 5, 15, vec!["w".to_string()]);
        let term = Element::terminator("t1", 50, 55, params, "geneA");
        let mask = Mask::new("mask", 100, 100, Vec::<String>::new());
        let mut poly = Polymer::new("poly", 100, vec![promoter, term], mask, 3);

        let mut terminated = None;
        poly.connect_termination_signal(move |(_, gene)| terminated = gene);

        let w = Polymerase::new("w", 30.0, 5);
        let id = poly.bind_polymerase(w, "p1").unwrap();
        let before_prop = poly.calculate_propensity();

        for _ in 0..60 {
            if poly.walker(id).is_none() {
                break;
            }
            poly.execute().unwrap();
        }

        assert!(poly.walker(id).is_none());
        assert_eq!(poly.calculate_propensity(), before_prop - 30.0);
    }

    #[test]
    fn test_scenario_5_mask_pushback() {
        let mask = Mask::new("mask", 20, 200, vec!["w".to_string()]);
        let promoter = Element::promoter("p1", 5, 15, vec!["w".to_string()]);
        let mut poly = Polymer::new("poly", 200, vec![promoter], mask, 9);

        let w = Polymerase::new("w", 30.0, 10);
        let id = poly.bind_polymerase(w, "p1").unwrap();

        for _ in 0..20 {
            poly.execute().unwrap();
        }

        assert!(poly.mask().start > 20);
        assert!(poly.walker(id).is_some());
    }

    #[test]
    fn test_shift_mask_is_noop_past_its_end() {
        let mask = Mask::new("mask", 10, 10, Vec::<String>::new());
        let mut poly = Polymer::new("poly", 100, vec![], mask, 4);
        poly.shift_mask();
        assert_eq!(poly.mask().start, 10);
    }

    #[test]
    fn test_execute_with_no_activity_errs() {
        let mask = Mask::new("mask", 100, 100, Vec::<String>::new());
        let mut poly = Polymer::new("poly", 100, vec![], mask, 5);
        let err = poly.execute().unwrap_err();
        assert!(matches!(err, Error::NoActivity { .. }));
    }
}
