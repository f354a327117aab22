//! Output formatting for the installer CLI.
//!
//! Progress and summaries go to stderr as plain lines; this module builds
//! those lines and writes them.

use crate::artifacts::Artifacts;
use crate::config::InstallConfig;
use crate::pipeline::InstallReport;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after installation.
///
/// # Example
///
/// ```
/// use provision_installer::output::success_message;
/// use provision_installer::pipeline::{InstallReport, PipelineState};
///
/// let report = InstallReport {
///     target_dir: "/opt/eap".into(),
///     distribution_root: Some("jboss-eap-7.4".to_owned()),
///     patches_applied: vec!["p1".to_owned()],
///     secured_entries: 12,
///     state: PipelineState::Secured,
/// };
/// assert_eq!(
///     success_message(&report),
///     "Installed jboss-eap-7.4 to /opt/eap with 1 patch"
/// );
/// ```
#[must_use]
pub fn success_message(report: &InstallReport) -> String {
    let count = report.patches_applied.len();
    let plural = if count == 1 { "patch" } else { "patches" };
    let root = report.distribution_root.as_deref().unwrap_or("distribution");
    format!("Installed {root} to {} with {count} {plural}", report.target_dir)
}

/// Configuration information for dry-run output.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The resolved configuration.
    pub config: &'a InstallConfig,
    /// Where artifacts would be read from.
    pub artifacts: &'a Artifacts,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Target directory: {}", self.config.target_dir),
            format!("Sources directory: {}", self.artifacts.sources_dir()),
            format!("Archive: {}", self.artifacts.path(&self.config.archive)),
            format!(
                "Ownership: {}:{} mode {}",
                self.config.owner, self.config.group, self.config.mode
            ),
            String::new(),
        ];

        if self.config.patches.is_empty() {
            lines.push("Patches: none".to_owned());
        } else {
            lines.push("Patches:".to_owned());
            for patch in &self.config.patches {
                lines.push(format!("  - {}", self.artifacts.path(patch)));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineState;
    use rstest::{fixture, rstest};

    #[fixture]
    fn report() -> InstallReport {
        InstallReport {
            target_dir: "/opt/eap".into(),
            distribution_root: Some("jboss-eap-7.4".to_owned()),
            patches_applied: Vec::new(),
            secured_entries: 3,
            state: PipelineState::Secured,
        }
    }

    #[rstest]
    #[case::none(0, "0 patches")]
    #[case::singular(1, "1 patch")]
    #[case::plural(2, "2 patches")]
    fn success_message_pluralises_correctly(
        mut report: InstallReport,
        #[case] count: usize,
        #[case] expected: &str,
    ) {
        report.patches_applied = vec!["p".to_owned(); count];
        let msg = success_message(&report);
        assert!(msg.ends_with(expected), "unexpected message: {msg}");
        assert!(msg.contains("/opt/eap"));
    }

    #[test]
    fn dry_run_lists_resolved_paths() {
        let config = InstallConfig::new("/opt/eap".into()).with_patches(["p1", "p2"]);
        let artifacts = Artifacts::new("/srv/sources".into());

        let text = DryRunInfo {
            config: &config,
            artifacts: &artifacts,
        }
        .display_text();

        assert!(text.starts_with("Dry run"));
        assert!(text.contains("Archive: /srv/sources/eap.zip"));
        assert!(text.contains("Ownership: jboss:jboss mode 0755"));
        assert!(text.contains("  - /srv/sources/p1\n  - /srv/sources/p2"));
    }

    #[test]
    fn dry_run_without_patches_says_so() {
        let config = InstallConfig::new("/opt/eap".into());
        let artifacts = Artifacts::new("/srv/sources".into());

        let text = DryRunInfo {
            config: &config,
            artifacts: &artifacts,
        }
        .display_text();

        assert!(text.ends_with("Patches: none"));
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }
}
