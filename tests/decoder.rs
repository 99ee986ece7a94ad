use ccgchart::{
    BeamParser, Decoder, DepsSumDecoder, FeatureKey, FeatureScorer, FscoreDecoder, GoldDeps, Grammar, Packing,
    ParserConfig, RuleKind, Sentence, ViterbiDecoder,
};

fn exhaustive(packing: Packing) -> ParserConfig {
    ParserConfig { use_beam: false, cube_pruning: false, packing, ..ParserConfig::default() }
}

fn attachment_sentence() -> Sentence {
    Sentence::new()
        .with("John", "NNP", &[("NP", 1.0)])
        .with("saw", "VBD", &[(r"(S[dcl]\NP)/NP", 1.0)])
        .with("Mary", "NNP", &[("NP", 1.0)])
        .with("with", "IN", &[(r"(NP\NP)/NP", 1.0), (r"((S\NP)\(S\NP))/NP", 1.0)])
        .with("Kim", "NNP", &[("NP", 1.0)])
}

fn gold(grammar: &Grammar, noun_attachment: bool) -> GoldDeps {
    let verb = r"(S[dcl]\NP)/NP";
    let mut gold = GoldDeps::new();
    gold.insert((grammar.relation(verb, 1).unwrap(), 2, 1));
    gold.insert((grammar.relation(verb, 2).unwrap(), 2, 3));
    if noun_attachment {
        let prep = r"(NP\NP)/NP";
        gold.insert((grammar.relation(prep, 1).unwrap(), 4, 3));
        gold.insert((grammar.relation(prep, 2).unwrap(), 4, 5));
    } else {
        let prep = r"((S\NP)\(S\NP))/NP";
        gold.insert((grammar.relation(prep, 1).unwrap(), 4, 2));
        gold.insert((grammar.relation(prep, 2).unwrap(), 4, 5));
    }
    gold
}

#[test]
fn viterbi_follows_the_best_member_of_each_class() {
    ccgchart::logging::init();
    let grammar = Grammar::standard().unwrap();
    let sentence = Sentence::new()
        .with("John", "NNP", &[("NP", 1.0)])
        .with("sleeps", "VBZ", &[(r"S[dcl]\NP", 1.0)]);
    let mut scorer = FeatureScorer::new();
    scorer.set_weight(FeatureKey::Rule { rule: RuleKind::FwdApp, category: "S[dcl]".into() }, 1.0);
    let mut parser = BeamParser::new(&grammar, scorer, ParserConfig::default()).unwrap();
    assert!(parser.parse(&sentence).unwrap().success);

    let chart = parser.chart();
    let derivation = ViterbiDecoder.decode(chart, &sentence).unwrap().unwrap();
    assert_eq!(derivation.score, 1.0);
    assert_eq!(chart.node(derivation.root).rule(), RuleKind::FwdApp);
    assert!(derivation.nodes.iter().any(|id| chart.node(*id).rule() == RuleKind::TypeRaise));
    assert_eq!(derivation.dependencies.len(), 1);

    let rep = parser.root().unwrap().nodes()[0];
    assert_eq!(chart.score(rep).max_equiv, 1.0);
    assert_eq!(chart.score(rep).best, derivation.root);
    assert_eq!(chart.members(rep).count(), 2);
}

#[test]
fn deps_sum_picks_the_gold_attachment() {
    ccgchart::logging::init();
    let grammar = Grammar::standard().unwrap();
    let sentence = attachment_sentence();
    let mut parser = BeamParser::new(&grammar, FeatureScorer::new(), exhaustive(Packing::Exact)).unwrap();
    assert!(parser.parse(&sentence).unwrap().success);

    for noun_attachment in [true, false] {
        let gold = gold(&grammar, noun_attachment);
        let decoder = DepsSumDecoder { gold: gold.clone() };
        let derivation = decoder.decode(parser.chart(), &sentence).unwrap().unwrap();
        assert_eq!(derivation.score, 4.0);
        assert_eq!(derivation.triples(), gold);
    }
}

#[test]
fn fscore_decoder_recovers_gold_with_split_packing() {
    ccgchart::logging::init();
    let grammar = Grammar::standard().unwrap();
    let sentence = attachment_sentence();
    let mut parser =
        BeamParser::new(&grammar, FeatureScorer::new(), exhaustive(Packing::SplitByOutside)).unwrap();
    assert!(parser.parse(&sentence).unwrap().success);

    for noun_attachment in [true, false] {
        let gold = gold(&grammar, noun_attachment);
        let decoder = FscoreDecoder { gold: gold.clone() };
        let derivation = decoder.decode(parser.chart(), &sentence).unwrap().unwrap();
        assert_eq!(derivation.score, 1.0);
        assert_eq!(derivation.triples(), gold);
    }
}

#[test]
fn empty_chart_decodes_to_nothing() {
    let grammar = Grammar::standard().unwrap();
    let sentence = Sentence::new();
    let mut parser = BeamParser::new(&grammar, FeatureScorer::new(), ParserConfig::default()).unwrap();
    let status = parser.parse(&sentence).unwrap();
    assert!(!status.success);
    assert!(ViterbiDecoder.decode(parser.chart(), &sentence).unwrap().is_none());
}
