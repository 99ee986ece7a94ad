use ccgchart::{Dependency, RuleKind, VarId, Variable};

fn fillers(v: &Variable) -> Vec<u16> {
    v.fillers().collect()
}

#[test]
fn merging_with_unfilled_keeps_the_filled_side() {
    assert_eq!(fillers(&Variable::new().unify(&Variable::filled(3))), vec![3]);
    assert_eq!(fillers(&Variable::filled(3).unify(&Variable::new())), vec![3]);
    assert!(!Variable::new().unify(&Variable::new()).is_filled());
}

#[test]
fn merging_is_a_sorted_union() {
    let merged = Variable::filled(5).unify(&Variable::filled(2));
    assert_eq!(fillers(&merged), vec![2, 5]);
    assert_eq!(merged, Variable::filled(2).unify(&Variable::filled(5)));
    assert_eq!(fillers(&merged.unify(&Variable::filled(5))), vec![2, 5]);
}

#[test]
fn coordinated_filler_fills_one_dependency_each() {
    let dep = Dependency { var: VarId(2), rel: 7, head: 1, lrange: VarId::NONE, rule: RuleKind::Lexical };
    let filler = Variable::filled(4).unify(&Variable::filled(6));
    let filled: Vec<_> = dep.fill(&filler, RuleKind::Coord).collect();
    assert_eq!(filled.len(), 2);
    assert_eq!(filled[0].triple(), (7, 1, 4));
    assert_eq!(filled[1].triple(), (7, 1, 6));
    assert!(filled.iter().all(|d| d.conj == 2 && d.rule == RuleKind::Coord && !d.lrange));
}
