//! Tests for installer CLI parsing and configuration resolution.

use super::*;
use crate::error::InstallerError;
use rstest::rstest;
use std::collections::BTreeMap;

/// Parses `args` with the target and sources variables cleared.
fn parse(args: &[&str]) -> Cli {
    temp_env::with_vars_unset([TARGET_ENV, SOURCES_ENV], || {
        Cli::parse_from(std::iter::once("provision-installer").chain(args.iter().copied()))
    })
}

fn manifest() -> ArtifactManifest {
    ArtifactManifest {
        archive: Some("eap.zip".to_owned()),
        patches: vec!["m1".to_owned(), "m2".to_owned()],
        artifacts: BTreeMap::from([("eap.zip".to_owned(), "jboss-eap-7.4.0.zip".to_owned())]),
    }
}

#[test]
fn cli_parses_defaults() {
    let cli = parse(&[]);
    assert!(cli.command.is_none());
    assert!(cli.install.target_dir.is_none());
    assert!(cli.install.sources_dir.is_none());
    assert!(cli.install.manifest.is_none());
    assert!(cli.install.patch.is_empty());
    assert!(cli.install.owner.is_none());
    assert!(cli.install.scratch_dir.is_none());
    assert!(!cli.install.dry_run);
    assert!(!cli.install.quiet);
}

#[test]
fn cli_parses_target_dir() {
    let cli = parse(&["-t", "/opt/eap"]);
    assert_eq!(cli.install.target_dir, Some(Utf8PathBuf::from("/opt/eap")));
}

#[test]
fn cli_reads_target_dir_from_environment() {
    let cli = temp_env::with_vars(
        [(TARGET_ENV, Some("/opt/from-env")), (SOURCES_ENV, None)],
        || Cli::parse_from(["provision-installer"]),
    );
    assert_eq!(
        cli.install.target_dir,
        Some(Utf8PathBuf::from("/opt/from-env"))
    );
}

#[test]
fn cli_parses_repeated_patches_in_order() {
    let cli = parse(&["--patch", "p1", "-p", "p2"]);
    assert_eq!(cli.install.patch, vec!["p1".to_owned(), "p2".to_owned()]);
}

#[test]
fn cli_parses_install_subcommand() {
    let cli = parse(&["install", "--dry-run", "-t", "/opt/eap"]);
    match &cli.command {
        Some(Command::Install(args)) => {
            assert!(args.dry_run);
            assert_eq!(args.target_dir, Some(Utf8PathBuf::from("/opt/eap")));
        }
        other => panic!("expected Install command, got {other:?}"),
    }
    assert!(cli.install_args().dry_run);
}

#[rstest]
#[case::recursive(&["chown", "-R", "jboss", "jboss", "/opt/eap"], true)]
#[case::single(&["chown", "185", "0", "/opt/eap"], false)]
fn cli_parses_chown(#[case] args: &[&str], #[case] recursive: bool) {
    match parse(args).command {
        Some(Command::Chown(chown)) => {
            assert_eq!(chown.recursive, recursive);
            assert_eq!(chown.path, Utf8PathBuf::from("/opt/eap"));
        }
        other => panic!("expected Chown command, got {other:?}"),
    }
}

#[test]
fn cli_parses_chmod() {
    match parse(&["chmod", "--recursive", "0750", "/opt/eap"]).command {
        Some(Command::Chmod(chmod)) => {
            assert!(chmod.recursive);
            assert_eq!(chmod.mode, "0750");
        }
        other => panic!("expected Chmod command, got {other:?}"),
    }
}

#[test]
fn install_args_falls_back_to_flattened_arguments() {
    let cli = parse(&["-q", "chmod", "0755", "/opt/eap"]);
    assert!(cli.install_args().quiet);
}

#[test]
fn resolve_requires_target() {
    let err = InstallArgs::default()
        .resolve(None)
        .expect_err("target is required");
    assert!(matches!(err, InstallerError::Configuration { .. }));
    assert!(err.to_string().contains(TARGET_ENV));
}

#[test]
fn resolve_applies_defaults() {
    let args = InstallArgs {
        target_dir: Some("/opt/eap".into()),
        ..InstallArgs::default()
    };

    let (config, artifacts) = args.resolve(None).expect("resolve");

    assert_eq!(config, InstallConfig::new("/opt/eap".into()));
    assert_eq!(artifacts.path("eap.zip"), "/tmp/scripts/sources/eap.zip");
}

#[test]
fn resolve_carries_scratch_dir() {
    let cli = parse(&["-t", "/opt/eap", "--scratch-dir", "/var/tmp/provision"]);

    let (config, _) = cli.install.resolve(None).expect("resolve");

    assert_eq!(config.scratch_dir, Some(Utf8PathBuf::from("/var/tmp/provision")));
}

#[test]
fn resolve_uses_manifest_patches_and_mappings() {
    let args = InstallArgs {
        target_dir: Some("/opt/eap".into()),
        sources_dir: Some("/srv".into()),
        ..InstallArgs::default()
    };

    let (config, artifacts) = args.resolve(Some(&manifest())).expect("resolve");

    assert_eq!(config.patches, vec!["m1".to_owned(), "m2".to_owned()]);
    assert_eq!(artifacts.path(&config.archive), "/srv/jboss-eap-7.4.0.zip");
}

#[test]
fn command_line_overrides_manifest() {
    let args = InstallArgs {
        target_dir: Some("/opt/eap".into()),
        archive: Some("eap-7.3.zip".to_owned()),
        patch: vec!["c1".to_owned()],
        owner: Some("185".to_owned()),
        group: Some("0".to_owned()),
        mode: Some("0750".to_owned()),
        ..InstallArgs::default()
    };

    let (config, _) = args.resolve(Some(&manifest())).expect("resolve");

    assert_eq!(config.archive, "eap-7.3.zip");
    assert_eq!(config.patches, vec!["c1".to_owned()]);
    assert_eq!(
        (config.owner.as_str(), config.group.as_str(), config.mode.as_str()),
        ("185", "0", "0750")
    );
}

#[rstest]
#[case::escaping_patch(InstallArgs { patch: vec!["../p1".to_owned()], ..InstallArgs::default() })]
#[case::nested_archive(InstallArgs { archive: Some("dir/eap.zip".to_owned()), ..InstallArgs::default() })]
fn resolve_rejects_non_plain_names(#[case] mut args: InstallArgs) {
    args.target_dir = Some("/opt/eap".into());
    let err = args.resolve(None).expect_err("name should be rejected");
    assert!(matches!(err, InstallerError::Configuration { .. }));
}

#[test]
fn resolve_rejects_bad_mode() {
    let args = InstallArgs {
        target_dir: Some("/opt/eap".into()),
        mode: Some("rwxr-xr-x".to_owned()),
        ..InstallArgs::default()
    };
    let err = args.resolve(None).expect_err("mode should be rejected");
    assert!(matches!(err, InstallerError::Resolution { .. }));
}
