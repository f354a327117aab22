//! Distribution installer CLI entrypoint.
//!
//! This binary unpacks an application-server distribution into `JBOSS_HOME`,
//! applies patches through the management CLI, and secures the result. The
//! `chown` and `chmod` subcommands expose the recursive attribute changes on
//! their own.

use clap::Parser;
use provision_common::{AttributeMutator, SystemAttributes, SystemIdentityDatabase};
use provision_installer::cli::{ChmodArgs, ChownArgs, Cli, Command, InstallArgs};
use provision_installer::error::{InstallerError, Result};
use provision_installer::executor::SystemCommandExecutor;
use provision_installer::management::JbossCli;
use provision_installer::manifest::ArtifactManifest;
use provision_installer::output::{DryRunInfo, success_message, write_stderr_line};
use provision_installer::pipeline::{InstallPipeline, PipelineContext};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Some(Command::Chown(args)) => run_chown(args, cli.install.quiet, stderr),
        Some(Command::Chmod(args)) => run_chmod(args, cli.install.quiet, stderr),
        Some(Command::Install(_)) | None => run_install(cli.install_args(), stderr),
    }
}

/// Installs the distribution, or describes the installation in dry-run mode.
fn run_install(args: &InstallArgs, stderr: &mut dyn Write) -> Result<()> {
    let manifest = args
        .manifest
        .as_deref()
        .map(ArtifactManifest::load)
        .transpose()?;
    let (config, artifacts) = args.resolve(manifest.as_ref())?;

    if args.dry_run {
        let info = DryRunInfo {
            config: &config,
            artifacts: &artifacts,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    if !args.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Installing {} into {}...",
                artifacts.path(&config.archive),
                config.target_dir
            ),
        );
    }

    let executor = SystemCommandExecutor;
    let cli = JbossCli::new(&executor, &config.target_dir);
    let context = PipelineContext {
        executor: &executor,
        cli: &cli,
        identities: &SystemIdentityDatabase,
        attributes: &SystemAttributes,
    };
    let report = InstallPipeline::new(config, artifacts, context)?.run()?;

    if !args.quiet {
        write_stderr_line(stderr, success_message(&report));
    }
    Ok(())
}

fn run_chown(args: &ChownArgs, quiet: bool, stderr: &mut dyn Write) -> Result<()> {
    let mutator = AttributeMutator::new(&SystemIdentityDatabase, &SystemAttributes);
    let report = mutator
        .chown(&args.owner, &args.group, args.path.as_std_path(), args.recursive)
        .map_err(|err| InstallerError::from_fs("chown", err))?;
    if !quiet {
        write_stderr_line(
            stderr,
            format!("Changed ownership of {} entries under {}", report.entries, args.path),
        );
    }
    Ok(())
}

fn run_chmod(args: &ChmodArgs, quiet: bool, stderr: &mut dyn Write) -> Result<()> {
    let mutator = AttributeMutator::new(&SystemIdentityDatabase, &SystemAttributes);
    let report = mutator
        .chmod(&args.mode, args.path.as_std_path(), args.recursive)
        .map_err(|err| InstallerError::from_fs("chmod", err))?;
    if !quiet {
        write_stderr_line(
            stderr,
            format!("Changed mode of {} entries under {}", report.entries, args.path),
        );
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
