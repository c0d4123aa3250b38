//! Core API shared by the CLI and other front-ends: loading projects,
//! running the ERC and replaying edit scripts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::circuit::CircuitError;
use crate::erc::{ErcCategory, ErcEntry, ErcMsgType, ErcOwner};
use crate::library::{Library, LibraryError};
use crate::project::Project;
use crate::script::{EditScript, ReplaySummary, ScriptRunner};
use crate::serialization::SExpError;

#[derive(Debug, thiserror::Error)]
pub enum CircuitryError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error("Step {step} ({description}) failed: {source}")]
    Step {
        step: usize,
        description: String,
        source: CircuitError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl From<SExpError> for CircuitryError {
    fn from(e: SExpError) -> Self {
        CircuitryError::Parse(e.to_string())
    }
}

/// Options for ERC runs.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Report ignored messages too. They never count towards the stats.
    pub include_ignored: bool,
    /// Treat warnings as errors.
    pub strict_mode: bool,
    /// Only report these categories. Empty means all.
    pub categories: Vec<ErcCategory>,
}

/// One reported ERC message.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErcFinding {
    pub category: ErcCategory,
    pub severity: ErcMsgType,
    /// Human readable owner, e.g. `R1` or `U1:VCC`.
    pub owner: String,
    /// Stable key of the message, as used in the ignore list.
    pub key: String,
    pub message: String,
    pub ignored: bool,
}

impl ErcFinding {
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ErcStats {
    pub errors: usize,
    pub warnings: usize,
    pub ignored: usize,
}

/// ERC result of one project.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErcReport {
    pub file: PathBuf,
    pub project: String,
    pub findings: Vec<ErcFinding>,
    pub stats: ErcStats,
}

impl ErcReport {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn has_warnings_or_errors(&self) -> bool {
        self.stats.errors > 0 || self.stats.warnings > 0
    }

    pub fn total_issues(&self) -> usize {
        self.stats.errors + self.stats.warnings
    }
}

fn owner_label(project: &Project, owner: &ErcOwner) -> String {
    let circuit = project.circuit();
    match owner {
        ErcOwner::ComponentInstance(uuid) => circuit
            .component_instance(uuid)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| uuid.to_str()),
        ErcOwner::ComponentSignalInstance { component, signal } => {
            match circuit.component_instance(component) {
                Some(instance) => {
                    let signal = instance
                        .signal(signal)
                        .map(|s| s.lib_signal().name.clone())
                        .unwrap_or_else(|| signal.to_str());
                    format!("{}:{}", instance.name(), signal)
                }
                None => format!("{component}:{signal}"),
            }
        }
        ErcOwner::NetClass(uuid) => circuit
            .net_class(uuid)
            .map(|class| class.name().to_string())
            .unwrap_or_else(|| uuid.to_str()),
    }
}

fn entry_to_finding(project: &Project, entry: &ErcEntry, strict: bool) -> ErcFinding {
    let severity = match entry.msg_type {
        ErcMsgType::CircuitWarning if strict => ErcMsgType::CircuitError,
        ErcMsgType::SchematicWarning if strict => ErcMsgType::SchematicError,
        ErcMsgType::BoardWarning if strict => ErcMsgType::BoardError,
        other => other,
    };
    ErcFinding {
        category: entry.key.category,
        severity,
        owner: owner_label(project, &entry.key.owner),
        key: entry.key.to_string(),
        message: entry.text.clone(),
        ignored: entry.ignored,
    }
}

/// Core API used by the CLI.
pub struct CircuitryCore;

impl CircuitryCore {
    pub fn load_library(path: &Path) -> Result<Library, CircuitryError> {
        Ok(Library::load(path)?)
    }

    /// Load a project file against the library JSON at `library`.
    pub fn load_project(path: &Path, library: &Path) -> Result<Project, CircuitryError> {
        let library = Arc::new(Self::load_library(library)?);
        let text = std::fs::read_to_string(path)?;
        let project = Project::from_text(&text, library).map_err(|e| match e {
            CircuitError::Parse(e) => CircuitryError::from(e),
            other => CircuitryError::Circuit(other),
        })?;
        tracing::info!(path = %path.display(), name = %project.name(), "Project loaded");
        Ok(project)
    }

    /// Collect the current ERC messages of a project.
    pub fn check_project(project: &Project, file: &Path, options: &CheckOptions) -> ErcReport {
        let mut findings = Vec::new();
        let mut stats = ErcStats::default();
        for entry in project.circuit().erc().iter() {
            if !options.categories.is_empty() && !options.categories.contains(&entry.key.category) {
                continue;
            }
            let finding = entry_to_finding(project, entry, options.strict_mode);
            if finding.ignored {
                stats.ignored += 1;
                if !options.include_ignored {
                    continue;
                }
            } else if finding.is_error() {
                stats.errors += 1;
            } else {
                stats.warnings += 1;
            }
            findings.push(finding);
        }
        tracing::debug!(
            errors = stats.errors,
            warnings = stats.warnings,
            ignored = stats.ignored,
            "ERC finished"
        );
        ErcReport {
            file: file.to_path_buf(),
            project: project.name().to_string(),
            findings,
            stats,
        }
    }

    pub fn check_files(
        path: &Path,
        library: &Path,
        options: &CheckOptions,
    ) -> Result<ErcReport, CircuitryError> {
        let project = Self::load_project(path, library)?;
        Ok(Self::check_project(&project, path, options))
    }

    /// Replay an edit script on a project through a fresh undo stack.
    pub fn replay(project: &mut Project, script: &EditScript) -> Result<ReplaySummary, CircuitryError> {
        let summary = ScriptRunner::new(project).run(script)?;
        tracing::info!(
            steps = summary.steps,
            modified = summary.modified,
            "Script replayed"
        );
        Ok(summary)
    }
}
