use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use guildforge::config::GaParams;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

// Minimal wrapper so the flattened GA flags can be parsed the same way
// the real subcommands parse them.
#[derive(Parser, Debug)]
struct Harness {
    #[command(flatten)]
    params: GaParams,
}

fn parse(args: &[&str]) -> (GaParams, ArgMatches) {
    let mut full = vec!["harness"];
    full.extend_from_slice(args);
    let matches = Harness::command().get_matches_from(full);
    let cli = Harness::from_arg_matches(&matches).unwrap();
    (cli.params, matches)
}

// --- DEFAULTS ---

#[test]
fn test_clap_defaults_match_default_impl() {
    let (from_cli, _) = parse(&[]);
    assert_eq!(from_cli, GaParams::default());
}

#[test]
fn test_resolved_discount_defaults_to_reciprocal_species_count() {
    assert_eq!(GaParams::default().resolved_discount(4), 0.25);
    let explicit = GaParams {
        discount: Some(0.5),
        ..GaParams::default()
    };
    assert_eq!(explicit.resolved_discount(4), 0.5);
}

// --- MERGE PRECEDENCE ---

#[test]
fn test_merge_keeps_base_values_for_untouched_fields() {
    let (cli_params, matches) = parse(&["--popsize", "33"]);

    let mut params = GaParams {
        generations: 50,
        elite: 0.2,
        ..GaParams::default()
    };
    params.merge_from_cli(&cli_params, &matches);

    assert_eq!(params.popsize, 33);
    assert_eq!(params.generations, 50);
    assert_eq!(params.elite, 0.2);
}

#[test]
fn test_merge_defaults_do_not_clobber_base() {
    // No flags given at all: the base (e.g. file-loaded) values survive.
    let (cli_params, matches) = parse(&[]);

    let mut params = GaParams {
        crossrate: 0.9,
        stopcv: 0.01,
        ..GaParams::default()
    };
    params.merge_from_cli(&cli_params, &matches);

    assert_eq!(params.crossrate, 0.9);
    assert_eq!(params.stopcv, 0.01);
}

#[test]
fn test_merge_overrides_optional_fields() {
    let (cli_params, matches) = parse(&["--discount", "0.2", "--norm-speed", "12.5"]);

    let mut params = GaParams::default();
    params.merge_from_cli(&cli_params, &matches);

    assert_eq!(params.discount, Some(0.2));
    assert_eq!(params.norm_speed, Some(12.5));
    assert_eq!(params.norm_distro, None);
}

// --- PARAMETER FILES ---

#[test]
fn test_load_from_file_fills_missing_fields_with_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "popsize": 40, "stopcv": 0.01, "discount": 0.5 }}"#
    )
    .unwrap();

    let params = GaParams::load_from_file(file.path()).unwrap();
    assert_eq!(params.popsize, 40);
    assert_eq!(params.stopcv, 0.01);
    assert_eq!(params.discount, Some(0.5));
    assert_eq!(params.generations, GaParams::default().generations);
}

#[test]
fn test_load_from_file_rejects_malformed_json() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "popsize: 40").unwrap();
    assert!(GaParams::load_from_file(file.path()).is_err());
}

#[test]
fn test_load_from_file_missing_path_is_an_error() {
    assert!(GaParams::load_from_file("/no/such/params.json").is_err());
}

// --- VALIDATION ---

#[rstest]
#[case::popsize_below_two(GaParams { popsize: 1, ..GaParams::default() })]
#[case::init_size_below_popsize(GaParams { popsize: 20, init_size: 19, ..GaParams::default() })]
#[case::zero_clusters(GaParams { n_clusters: 0, ..GaParams::default() })]
#[case::more_clusters_than_species(GaParams { n_clusters: 7, ..GaParams::default() })]
#[case::zero_generations(GaParams { generations: 0, ..GaParams::default() })]
#[case::crossrate_above_one(GaParams { crossrate: 1.5, ..GaParams::default() })]
#[case::negative_migration(GaParams { migration: -0.1, ..GaParams::default() })]
#[case::elite_above_one(GaParams { elite: 1.01, ..GaParams::default() })]
#[case::negative_keepworse(GaParams { keepworse: -0.5, ..GaParams::default() })]
fn test_validate_rejects_bad_params(#[case] params: GaParams) {
    assert!(params.validate(6).is_err());
}

#[test]
fn test_validate_accepts_defaults() {
    assert!(GaParams::default().validate(6).is_ok());
}

#[test]
fn test_validate_accepts_boundary_probabilities() {
    let params = GaParams {
        crossrate: 1.0,
        migration: 0.0,
        elite: 1.0,
        keepworse: 0.0,
        mutate_distro: 1.0,
        ..GaParams::default()
    };
    assert!(params.validate(6).is_ok());
}
