use ccgchart::chart::Added;
use ccgchart::combinators::type_change;
use ccgchart::supercat::Child;
use ccgchart::unify::Unify;
use ccgchart::{Chart, Grammar, Packing, SuperCategory};

fn lexical(grammar: &Grammar, plain: &str, position: u16) -> SuperCategory {
    SuperCategory::lexical(grammar.lexical(plain).unwrap(), position).unwrap()
}

#[test]
fn equivalent_nodes_share_a_class() {
    let grammar = Grammar::standard().unwrap();
    let mut chart = Chart::new(2, Packing::Exact);
    let first = chart.add(0, 1, lexical(&grammar, "NP", 1), 0.0, -1.0).unwrap();
    let second = chart.add(0, 1, lexical(&grammar, "NP", 1), 0.0, -0.5).unwrap();

    let rep = match first {
        Added::New(id) => id,
        other => panic!("expected a new class, got {:?}", other),
    };
    assert_eq!(second, Added::Packed { node: second.node(), rep });
    assert_eq!(chart.cell(0, 1).len(), 1);
    assert_eq!(chart.len(), 2);
    assert_eq!(chart.members(rep).collect::<Vec<_>>(), vec![rep, second.node()]);
    assert_eq!(chart.score(rep).max_equiv, -0.5);
    assert_eq!(chart.score(rep).best, second.node());
}

#[test]
fn different_heads_stay_apart() {
    let grammar = Grammar::standard().unwrap();
    let mut chart = Chart::new(2, Packing::Exact);
    chart.add(0, 1, lexical(&grammar, "NP", 1), 0.0, 0.0).unwrap();
    let other = chart.add(0, 1, lexical(&grammar, "NP", 2), 0.0, 0.0).unwrap();
    assert!(matches!(other, Added::New(_)));
    let third = chart.add(0, 1, lexical(&grammar, "N", 1), 0.0, 0.0).unwrap();
    assert!(matches!(third, Added::New(_)));
    assert_eq!(chart.cell(0, 1).len(), 3);
}

#[test]
fn type_changed_nodes_are_not_packed_with_lexical_ones() {
    let grammar = Grammar::standard().unwrap();
    let mut chart = Chart::new(1, Packing::Exact);
    let noun = chart.add(0, 1, lexical(&grammar, "N", 1), 0.0, 0.0).unwrap().node();

    let rule = grammar.type_changes().iter().find(|r| r.from.is_n()).unwrap();
    let mut u = Unify::new();
    let mut out = Vec::new();
    assert!(type_change(&mut u, Child::new(noun, chart.node(noun)), rule, &mut out).unwrap());
    let changed = out.pop().unwrap();
    assert!(changed.cat.is_np());
    assert!(changed.is_type_changed());
    assert_eq!(changed.left(), Some(noun));

    let np = chart.add(0, 1, lexical(&grammar, "NP", 1), 0.0, 0.0).unwrap();
    assert!(matches!(np, Added::New(_)));
    let tc = chart.add(0, 1, changed, 0.0, 0.0).unwrap();
    assert!(matches!(tc, Added::New(_)));
    assert_eq!(chart.cell(0, 1).len(), 3);
}

#[test]
fn split_packing_still_packs_equal_dependency_counts() {
    let grammar = Grammar::standard().unwrap();
    let mut chart = Chart::new(1, Packing::SplitByOutside);
    chart.add(0, 1, lexical(&grammar, r"S[dcl]\NP", 1), 0.0, 0.0).unwrap();
    let again = chart.add(0, 1, lexical(&grammar, r"S[dcl]\NP", 1), 0.0, 0.0).unwrap();
    assert!(matches!(again, Added::Packed { .. }));
}

#[test]
fn beam_keeps_the_best_classes_within_beta() {
    let grammar = Grammar::standard().unwrap();
    let mut chart = Chart::new(5, Packing::Exact);
    for (position, score) in [(1, 0.0), (2, -1.0), (3, -3.0), (4, -9.0), (5, -2.0)] {
        chart.add(0, 1, lexical(&grammar, "NP", position), 0.0, score).unwrap();
    }

    chart.apply_beam(0, 1, 4, 2.5);
    let scores: Vec<f64> = chart.cell(0, 1).nodes().iter().map(|id| chart.score(*id).max_equiv).collect();
    assert_eq!(scores, vec![0.0, -1.0, -2.0]);

    chart.apply_beam(0, 1, 1, 2.5);
    assert_eq!(chart.cell(0, 1).len(), 1);
    assert_eq!(chart.score(chart.cell(0, 1).nodes()[0]).max_equiv, 0.0);
}

#[test]
fn cells_outside_the_chart_are_rejected() {
    let grammar = Grammar::standard().unwrap();
    let mut chart = Chart::new(2, Packing::Exact);
    assert!(chart.add(1, 2, lexical(&grammar, "NP", 1), 0.0, 0.0).is_err());
    assert!(chart.add(0, 0, lexical(&grammar, "NP", 1), 0.0, 0.0).is_err());
    assert!(chart.is_empty());
}
