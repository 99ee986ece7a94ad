use ccgchart::unify::Unify;
use ccgchart::{parse_category, Category, Feature};

const CATEGORIES: [&str; 10] = [
    "NP{_}",
    "N{_}",
    "S[dcl]{_}",
    "S[X]{Y}",
    r"(S[dcl]{_}\NP{Y}<1>){_}",
    r"(S[X]{Y}\NP{Z}){Y}",
    r"((S[dcl]{_}\NP{Y}<1>){_}/NP{Z}<2>){_}",
    r"((S[X]{Y}\NP{Z}){Y}\(S[X]{Y}<1>\NP{Z}){Y}){_}",
    r"(S[X]{Y}/(S[X]{Y}\NP{_}){Y}){Y}",
    "(NP{Y}/N{Y}<1>){_}",
];

fn cat(text: &str) -> Category {
    parse_category(text).unwrap()
}

#[test]
fn unification_is_symmetric() {
    let mut u = Unify::new();
    for a in CATEGORIES {
        for b in CATEGORIES {
            let forward = u.unify(&cat(a), &cat(b)).unwrap();
            let backward = u.unify(&cat(b), &cat(a)).unwrap();
            assert_eq!(forward, backward, "{} vs {}", a, b);
        }
    }
}

#[test]
fn different_shapes_never_unify() {
    let mut u = Unify::new();
    for a in CATEGORIES {
        for b in CATEGORIES {
            let (a, b) = (cat(a), cat(b));
            if a.uhash() != b.uhash() {
                assert!(!u.unify(&a, &b).unwrap(), "{} unified with {}", a, b);
            }
        }
    }
}

#[test]
fn verb_phrase_unifies_with_modifier_argument() {
    let mut u = Unify::new();
    let vp = cat(r"(S[dcl]{_}\NP{Y}<1>){_}");
    let modifier = cat(r"(S[X]{Y}\NP{Z}){Y}");
    assert!(u.unify(&vp, &modifier).unwrap());
    assert_eq!(u.feature(), Feature::Dcl);
    // head and subject each end up in one shared variable
    assert_eq!(u.trans1[1], u.trans2[2]);
    assert_eq!(u.trans1[2], u.trans2[3]);
    assert_ne!(u.trans1[1], u.trans1[2]);
    assert_eq!(u.nvars(), 2);
}

#[test]
fn conflicting_features_fail() {
    let mut u = Unify::new();
    assert!(!u.unify(&cat(r"(S[dcl]{_}\NP{Y}){_}"), &cat(r"(S[b]{_}\NP{Y}){_}")).unwrap());
    assert!(u.unify(&cat(r"(S[X]{_}\NP{Y}){_}"), &cat(r"(S[b]{_}\NP{Y}){_}")).unwrap());
    assert_eq!(u.feature(), Feature::B);
}

#[test]
fn reorder_is_idempotent() {
    for text in CATEGORIES {
        let (once, _) = cat(text).reorder();
        let (twice, _) = once.reorder();
        assert!(once.identical(&twice), "{}", text);
        assert_eq!(once.var().0, 1, "{}", text);
    }
}

#[test]
fn plain_equality_ignores_variables() {
    let a = cat(r"(S[dcl]{_}\NP{Y}<1>){_}");
    let b = cat(r"(S[dcl]{Z}\NP{W}){Z}");
    assert_eq!(a, b);
    assert!(!a.identical(&b));
    assert_eq!(a.to_string(), r"S[dcl]\NP");
    assert_eq!(cat(r"(S[X]{Y}\NP{Z}){Y}").to_string(), r"S\NP");
}
