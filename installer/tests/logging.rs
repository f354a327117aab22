//! Log output of the unpack and patch stages.
//!
//! `logtest` installs a process-wide logger, so this binary holds a single
//! test.

use camino::Utf8PathBuf;
use log::Level;
use provision_installer::artifacts::Artifacts;
use provision_installer::config::InstallConfig;
use provision_installer::pipeline::{InstallPipeline, PipelineContext, PipelineState};
use provision_installer::test_utils::{
    InProcessUnzip, RecordingAttributes, RecordingCli, StaticIdentities, write_zip,
};

#[test]
fn stage_logs_follow_scoped_resources() {
    let mut logger = logtest::Logger::start();

    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let base = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("utf-8 temp path");
    let sources = base.join("sources");
    std::fs::create_dir_all(&sources).expect("create sources");
    write_zip(
        sources.join("eap.zip").as_std_path(),
        &[("jboss-eap-7.4/", ""), ("jboss-eap-7.4/version.txt", "7.4.0")],
    )
    .expect("write archive");

    let executor = InProcessUnzip::new();
    let cli = RecordingCli::new();
    let identities = StaticIdentities::with("jboss", 185, "jboss", 185);
    let attributes = RecordingAttributes::new();
    let context = PipelineContext {
        executor: &executor,
        cli: &cli,
        identities: &identities,
        attributes: &attributes,
    };
    let config = InstallConfig::new(base.join("eap")).with_sources_dir(sources.clone());
    let mut pipeline =
        InstallPipeline::new(config, Artifacts::new(sources), context).expect("pipeline");

    pipeline.unpack().expect("unpack");
    pipeline.apply_patches().expect("patch stage");

    assert_eq!(pipeline.state(), PipelineState::Patched);
    assert!(cli.commands().is_empty());

    let mut records = Vec::new();
    while let Some(record) = logger.pop() {
        records.push((record.level(), record.args().to_string()));
    }
    let logged = |level: Level, message: &str| {
        records
            .iter()
            .any(|(seen, args)| *seen == level && args == message)
    };

    assert!(
        logged(Level::Info, "No patches to apply, skipping"),
        "expected the patch stage to log that it skipped"
    );
    assert!(logged(Level::Debug, "acquired scratch directory for unpack stage"));
    assert!(logged(Level::Debug, "released scratch directory for unpack stage"));
    assert!(
        !records
            .iter()
            .any(|(_, args)| args.contains("management CLI session")),
        "an empty patch list opens no CLI session"
    );
}
