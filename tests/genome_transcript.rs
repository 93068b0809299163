//! Integration test for scenario 6: a `Genome` bind constructs a child
//! `Transcript` whose mask tracks the parent walker's movement, over the
//! exact element set `_build_transcript` derives from the gene template.

use std::cell::RefCell;
use std::rc::Rc;

use polykernel::feature::{Element, Mask, Polymerase};
use polykernel::genome::{GeneTemplate, Genome};

#[test]
fn test_bind_builds_transcript_with_expected_elements_and_tracks_mask() {
    let promoter = Element::promoter("p1", 200, 200, vec!["rnap".to_string()]);
    let genome_mask = Mask::new("mask", 590, 600, Vec::<String>::new());
    let template = vec![
        GeneTemplate::new("geneA", 230, 270, 15, 40),
        GeneTemplate::new("geneB", 300, 600, 15, 300),
        GeneTemplate::new("geneC", 650, 690, 20, 40),
    ];
    let mut genome = Genome::new("chr", 600, vec![promoter], genome_mask, template, 13);

    // `bind_polymerase` fires `transcript_signal` synchronously; capture the
    // built transcript to inspect it directly.
    let captured = Rc::new(RefCell::new(None));
    let captured_handle = captured.clone();
    genome
        .transcript_signal
        .connect(move |t| *captured_handle.borrow_mut() = Some(t));

    let rnap = Polymerase::new("rnap", 30.0, 1);
    let id = genome.bind_polymerase(rnap, "p1").unwrap();
    assert_eq!(genome.walker(id).unwrap().start, 200);

    let transcript = captured.borrow().clone().expect("transcript_signal must fire on bind");
    {
        let t = transcript.borrow();
        let spans: Vec<(u64, u64)> = t.elements().iter().map(|e| (e.start, e.stop)).collect();
        assert_eq!(spans, vec![(215, 230), (269, 270), (285, 300), (599, 600)]);
        assert_eq!(t.mask().start, 200);
    }

    for _ in 0..10 {
        genome.execute().unwrap();
    }

    assert_eq!(transcript.borrow().mask().start, 210);
    assert_eq!(genome.walker(id).unwrap().start, 210);
}
