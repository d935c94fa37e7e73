//! Tests for check-deps, checksum, completions and man.

use super::parse;
use crate::cli::console::progress_line;
use crate::cli::{Cli, CliCommand, DepsTarget};
use clap::{CommandFactory, Parser};
use std::path::Path;

#[test]
fn cli_parse_check_deps_defaults_to_apk() {
    match parse(&["tsto-patch", "check-deps"]) {
        CliCommand::CheckDeps { target } => assert_eq!(target, DepsTarget::Apk),
        _ => panic!("expected CheckDeps"),
    }
    match parse(&["tsto-patch", "check-deps", "--target", "ipa"]) {
        CliCommand::CheckDeps { target } => assert_eq!(target, DepsTarget::Ipa),
        _ => panic!("expected CheckDeps --target ipa"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["tsto-patch", "checksum", "/tmp/game-patched.apk", "--expect", "abc"]) {
        CliCommand::Checksum { path, expect } => {
            assert_eq!(path, Path::new("/tmp/game-patched.apk"));
            assert_eq!(expect.as_deref(), Some("abc"));
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_parse_completions_and_man() {
    match parse(&["tsto-patch", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Bash),
        _ => panic!("expected Completions"),
    }
    assert!(matches!(parse(&["tsto-patch", "man"]), CliCommand::Man));
    assert!(Cli::try_parse_from(["tsto-patch", "completions", "cmd.exe"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn progress_line_is_right_aligned() {
    assert_eq!(progress_line(5, "Decompiling IPA..."), "[  5%] Decompiling IPA...");
    assert_eq!(progress_line(100, "APK patched successfully!"), "[100%] APK patched successfully!");
}
