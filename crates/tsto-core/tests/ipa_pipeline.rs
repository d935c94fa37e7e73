//! IPA pipeline against real zip packages.

mod common;

use std::fs::{self, File};
use std::io::Read;

use common::{binary_with, request, write_ipa, DLC_LITERAL, GAME_LITERAL, INFO_PLIST};
use tsto_core::archive::ZipRepacker;
use tsto_core::config::UrlConfig;
use tsto_core::pipeline::TargetKind;
use tsto_core::{patch_ipa, PatchError, RecordingObserver};
use zip::ZipArchive;

fn read_entry(ipa: &std::path::Path, name: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(File::open(ipa).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn patches_plist_and_executable() {
    let work = tempfile::tempdir().unwrap();
    let ipa = work.path().join("Tapped Out.ipa");
    let exe = binary_with(&[DLC_LITERAL, GAME_LITERAL]);
    write_ipa(&ipa, INFO_PLIST, &exe);

    let req = request(
        TargetKind::Ipa,
        &ipa,
        work.path(),
        "https://api.example.com/",
        "http://cdn.example.com",
    );
    let mut rec = RecordingObserver::default();
    let report = patch_ipa(&req, &UrlConfig::default(), &mut ZipRepacker, &mut rec).unwrap();

    let out = work.path().join("out/Tapped Out-patched.ipa");
    assert_eq!(report.output.as_deref(), Some(out.as_path()));
    assert!(out.is_file());
    assert!(!work.path().join("out/Tapped Out-patched.ipa.part").exists());
    assert!(!report.signed);
    assert!(report.manifest_updated);
    assert_eq!(report.replacements.len(), 2);
    assert_eq!(report.sha256.as_ref().map(|s| s.len()), Some(64));

    let plist = String::from_utf8(read_entry(&out, "Payload/Tapped Out.app/Info.plist")).unwrap();
    assert_eq!(plist.matches("<key>MayhemServerURL</key>").count(), 1);
    assert!(plist.contains("<string>https://api.example.com</string>"));
    assert!(plist.contains("<string>http://cdn.example.com/static/</string>"));

    let patched = read_entry(&out, "Payload/Tapped Out.app/Tapped Out");
    assert_eq!(patched.len(), exe.len());
    let game = b"https://api.example.com////////";
    assert_eq!(game.len(), GAME_LITERAL.len());
    assert!(patched.windows(game.len()).any(|w| w == game));
    assert!(!patched.windows(DLC_LITERAL.len()).any(|w| w == DLC_LITERAL.as_bytes()));

    let percents: Vec<u8> = rec.progress.iter().map(|(p, _)| *p).collect();
    assert_eq!(percents, vec![0, 10, 40, 60, 80, 100]);
    assert_eq!(rec.progress.last().unwrap().1, "IPA patching completed successfully!");
    assert!(rec.errors.is_empty());
}

#[test]
fn stale_tree_content_is_discarded() {
    let work = tempfile::tempdir().unwrap();
    let stale = work.path().join("decipa/Payload/Old.app");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("Old"), b"stale").unwrap();

    let ipa = work.path().join("game.ipa");
    write_ipa(&ipa, INFO_PLIST, &binary_with(&[DLC_LITERAL]));
    let req = request(TargetKind::Ipa, &ipa, work.path(), "https://a.example", "https://b.example");
    let mut rec = RecordingObserver::default();
    patch_ipa(&req, &UrlConfig::default(), &mut ZipRepacker, &mut rec).unwrap();

    assert!(!stale.exists());
    let out = work.path().join("out/game-patched.ipa");
    let zip = ZipArchive::new(File::open(out).unwrap()).unwrap();
    assert!(zip.file_names().all(|n| !n.contains("Old.app")));
}

#[test]
fn missing_payload_fails_with_named_target() {
    let work = tempfile::tempdir().unwrap();
    let ipa = work.path().join("broken.ipa");
    {
        use std::io::Write;
        let mut zip = zip::ZipWriter::new(File::create(&ipa).unwrap());
        zip.start_file("README.txt", zip::write::SimpleFileOptions::default()).unwrap();
        zip.write_all(b"no payload").unwrap();
        zip.finish().unwrap();
    }
    let req = request(TargetKind::Ipa, &ipa, work.path(), "https://a.example", "https://b.example");
    let mut rec = RecordingObserver::default();
    let err = patch_ipa(&req, &UrlConfig::default(), &mut ZipRepacker, &mut rec).unwrap_err();

    assert!(matches!(err, PatchError::TargetNotFound { ref what, .. } if what == "Payload directory"));
    assert_eq!(rec.errors.len(), 1);
    assert!(rec.errors[0].contains("Payload directory"));
    assert_eq!(rec.progress.last(), Some(&(100, "Failed to patch IPA".to_string())));
    assert!(!work.path().join("out/broken-patched.ipa").exists());
}

#[test]
fn too_long_dlc_endpoint_leaves_manifest_untouched() {
    let work = tempfile::tempdir().unwrap();
    let ipa = work.path().join("game.ipa");
    write_ipa(&ipa, INFO_PLIST, &binary_with(&[DLC_LITERAL, GAME_LITERAL]));
    let dlc = format!("https://{}.example.com", "x".repeat(90));
    let req = request(TargetKind::Ipa, &ipa, work.path(), "https://a.example", &dlc);
    let mut rec = RecordingObserver::default();
    let err = patch_ipa(&req, &UrlConfig::default(), &mut ZipRepacker, &mut rec).unwrap_err();

    assert!(matches!(err, PatchError::ReplacementTooLong { .. }));
    let plist = fs::read_to_string(work.path().join("decipa/Payload/Tapped Out.app/Info.plist")).unwrap();
    assert_eq!(plist, INFO_PLIST);
    assert_eq!(rec.progress.last().unwrap().0, 100);
}
