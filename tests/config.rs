use std::fs;

use ccgchart::{CcgError, Packing, ParserConfig};

#[test]
fn loads_settings_from_a_file() {
    let path = std::env::temp_dir().join(format!("ccgchart-config-{}.toml", std::process::id()));
    fs::write(
        &path,
        "max_words = 100\nbeam_size = 8\nbetas = [0.1, 0.01]\ncube_pruning = false\npacking = \"split_by_outside\"\n",
    )
    .unwrap();
    let config = ParserConfig::load(&path);
    fs::remove_file(&path).ok();

    let config = config.expect("config loads");
    assert_eq!(config.max_words, 100);
    assert_eq!(config.beam_size, 8);
    assert_eq!(config.betas, vec![0.1, 0.01]);
    assert!(!config.cube_pruning);
    assert_eq!(config.packing, Packing::SplitByOutside);
    assert!(config.use_beam);
    assert_eq!(config.beta(1), 0.01);
    assert_eq!(config.beta(7), 0.0);
}

#[test]
fn missing_file_is_a_config_error() {
    let err = ParserConfig::load("/nonexistent/ccgchart.toml").unwrap_err();
    assert!(matches!(err, CcgError::Config(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn invalid_settings_are_rejected() {
    assert!(matches!(ParserConfig::from_toml_str("beam_size = 0"), Err(CcgError::Config(_))));
    assert!(matches!(ParserConfig::from_toml_str("start_level = 5"), Err(CcgError::Config(_))));
    assert!(matches!(ParserConfig::from_toml_str("max_words = 70000"), Err(CcgError::Config(_))));
    let no_betas = ParserConfig { betas: Vec::new(), ..ParserConfig::default() };
    assert!(no_betas.validate().is_err());
}

#[test]
fn unknown_packing_mode_fails_to_deserialize() {
    assert!(ParserConfig::from_toml_str("packing = \"loose\"").is_err());
}
