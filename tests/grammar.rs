use ccgchart::{
    BeamParser, CcgError, Decoder, FeatureScorer, Grammar, ParserConfig, RuleKind, Sentence, ViterbiDecoder,
};

fn parse<'g>(grammar: &'g Grammar, config: ParserConfig, sentence: &Sentence) -> BeamParser<'g, FeatureScorer> {
    ccgchart::logging::init();
    let mut parser = BeamParser::new(grammar, FeatureScorer::new(), config).unwrap();
    assert!(parser.parse(sentence).unwrap().success, "no spanning analysis");
    parser
}

#[test]
fn standard_grammar_knows_its_relations() {
    let grammar = Grammar::standard().unwrap();
    let subject = grammar.relation(r"(S[dcl]\NP)/NP", 1).unwrap();
    let object = grammar.relation(r"(S[dcl]\NP)/NP", 2).unwrap();
    assert_ne!(subject, object);
    assert_eq!(grammar.slot(object), Some((r"(S[dcl]\NP)/NP", 2)));
    assert_eq!(grammar.markedup(r"(S[dcl]\NP)/NP"), Some(r"((S[dcl]{_}\NP{Y}<1>){_}/NP{Z}<2>){_}"));
    assert!(grammar.lexical("(NP/N)").is_some());
    assert!(grammar.lexical("NP/PP").is_none());
}

#[test]
fn mismatched_markup_is_rejected() {
    let mut grammar = Grammar::new();
    let err = grammar.add_category("NP/N", r"(NP{Y}\N{Y}<1>){_}").unwrap_err();
    assert!(matches!(err, CcgError::Grammar { .. }));
    let err = grammar.add_category("NP/N", r"(NP{Y}/N{Y}<1>){Y}").unwrap_err();
    assert!(matches!(err, CcgError::Grammar { .. }));
    assert!(grammar.add_unary_rule(RuleKind::FwdApp, "N{_}", "NP{_}").is_err());
    assert!(matches!(grammar.add_plain("NP/(N"), Err(CcgError::CategoryParse { .. })));
}

#[test]
fn seen_rules_restrict_combination() {
    let mut grammar = Grammar::standard().unwrap();
    grammar.allow_rule("NP", r"S[dcl]\NP").unwrap();
    let sentence = Sentence::new()
        .with("John", "NNP", &[("NP", 1.0)])
        .with("sleeps", "VBZ", &[(r"S[dcl]\NP", 1.0)]);

    let open = parse(&grammar, ParserConfig::default(), &sentence);
    let open_nodes = open.chart().len();

    let config = ParserConfig { seen_rules: true, ..ParserConfig::default() };
    let mut restricted = BeamParser::new(&grammar, FeatureScorer::new(), config).unwrap();
    let status = restricted.parse(&sentence).unwrap();
    assert!(status.success);
    assert!(restricted.chart().len() < open_nodes);
    assert_eq!(status.stats.count(RuleKind::FwdApp), 0);
    assert_eq!(status.stats.count(RuleKind::BwdApp), 1);
}

#[test]
fn comma_absorbs_into_apposition_and_coordination() {
    let grammar = Grammar::standard().unwrap();
    let sentence = Sentence::new()
        .with("John", "NNP", &[("NP", 1.0)])
        .with(",", ",", &[(",", 1.0)])
        .with("Mary", "NNP", &[("NP", 1.0)]);
    let parser = parse(&grammar, ParserConfig::default(), &sentence);
    let chart = parser.chart();

    let mut heads: Vec<Vec<u16>> = parser
        .root()
        .unwrap()
        .nodes()
        .iter()
        .map(|id| chart.node(*id))
        .filter(|node| node.cat.is_np() && !node.is_unary())
        .map(|node| node.heads().fillers().collect())
        .collect();
    heads.sort();
    assert_eq!(heads, vec![vec![1], vec![1, 3]]);

    let comma_cell = chart.cell(1, 2);
    assert!(comma_cell.nodes().iter().any(|id| chart.node(*id).rule() == RuleKind::LeftCommaTypeChange));
    assert!(comma_cell.nodes().iter().any(|id| chart.node(*id).is_comma_conj()));
}

#[test]
fn sentence_before_comma_becomes_a_modifier() {
    let grammar = Grammar::standard().unwrap();
    let sentence = Sentence::new()
        .with("Kim", "NNP", &[("NP", 1.0)])
        .with("left", "VBD", &[(r"S[dcl]\NP", 1.0)])
        .with(",", ",", &[(",", 1.0)])
        .with("Sandy", "NNP", &[("NP", 1.0)])
        .with("stayed", "VBD", &[(r"S[dcl]\NP", 1.0)]);
    let config = ParserConfig { cube_pruning: false, ..ParserConfig::default() };
    let parser = parse(&grammar, config, &sentence);
    let chart = parser.chart();

    assert!(chart.cell(0, 3).nodes().iter().any(|id| chart.node(*id).rule() == RuleKind::RightCommaTypeChange));
    let derivation = ViterbiDecoder.decode(chart, &sentence).unwrap().unwrap();
    let modifier = grammar.relation("S/S", 1).unwrap();
    assert!(derivation.triples().contains(&(modifier, 2, 5)));
    assert!(chart.node(derivation.root).heads().contains(5));
}

#[test]
fn punctuation_is_absorbed_on_both_sides() {
    let grammar = Grammar::standard().unwrap();
    let sentence = Sentence::new()
        .with("LRB", "(", &[("LRB", 1.0)])
        .with("John", "NNP", &[("NP", 1.0)])
        .with("sleeps", "VBZ", &[(r"S[dcl]\NP", 1.0)])
        .with(".", ".", &[(".", 1.0)]);
    let parser = parse(&grammar, ParserConfig::default(), &sentence);
    let chart = parser.chart();
    let rules: Vec<RuleKind> = parser
        .root()
        .unwrap()
        .nodes()
        .iter()
        .flat_map(|rep| chart.members(*rep))
        .map(|id| chart.node(id).rule())
        .collect();
    assert!(rules.contains(&RuleKind::LeftPunct));
    assert!(rules.contains(&RuleKind::RightPunct));
}
