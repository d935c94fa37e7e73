//! Tests for the apk and ipa subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_apk() {
    match parse(&[
        "tsto-patch",
        "apk",
        "game.apk",
        "--game-server",
        "https://api.example.com",
        "--dlc-server",
        "http://cdn.example.com",
    ]) {
        CliCommand::Apk(args) => {
            assert_eq!(args.package, Path::new("game.apk"));
            assert_eq!(args.game_server, "https://api.example.com");
            assert_eq!(args.dlc_server, "http://cdn.example.com");
            assert!(args.output_dir.is_none());
            assert!(args.report.is_none());
        }
        _ => panic!("expected Apk"),
    }
}

#[test]
fn cli_parse_ipa_with_options() {
    match parse(&[
        "tsto-patch",
        "ipa",
        "Tapped Out.ipa",
        "--game-server",
        "https://a",
        "--dlc-server",
        "https://b",
        "--output-dir",
        "/tmp/out",
        "--report",
        "run.json",
    ]) {
        CliCommand::Ipa(args) => {
            assert_eq!(args.package, Path::new("Tapped Out.ipa"));
            assert_eq!(args.output_dir.as_deref(), Some(Path::new("/tmp/out")));
            assert_eq!(args.report.as_deref(), Some(Path::new("run.json")));
        }
        _ => panic!("expected Ipa"),
    }
}

#[test]
fn cli_patch_requires_both_servers() {
    assert!(Cli::try_parse_from(["tsto-patch", "apk", "game.apk", "--game-server", "https://a"]).is_err());
    assert!(Cli::try_parse_from(["tsto-patch", "ipa", "game.ipa", "--dlc-server", "https://b"]).is_err());
}

#[test]
fn cli_verbose_is_global() {
    let cli = Cli::try_parse_from([
        "tsto-patch",
        "apk",
        "game.apk",
        "--game-server",
        "https://a",
        "--dlc-server",
        "https://b",
        "--verbose",
    ])
    .unwrap();
    assert!(cli.verbose);
    let cli = Cli::try_parse_from(["tsto-patch", "-v", "check-deps"]).unwrap();
    assert!(cli.verbose);
}
