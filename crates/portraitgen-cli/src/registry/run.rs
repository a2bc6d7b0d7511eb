use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use portraitgen_comfy::SubmissionReport;
use portraitgen_generate::BatchReport;

use super::{RegistryError, RegistryResult};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub command: String,
    pub runs_dir: PathBuf,
}

impl RunContext {
    pub fn new(command: &str, runs_dir: &Path) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            command: command.to_string(),
            runs_dir: runs_dir.to_path_buf(),
        }
    }
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
struct RunConfig<'a, T: Serialize> {
    run_id: &'a str,
    started_at: String,
    command: &'a str,
    options: &'a T,
    git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
struct GitInfo {
    commit: Option<String>,
    dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub report_path: PathBuf,
    pub submission_path: PathBuf,
}

/// Create `<runs_dir>/<timestamp>__run_<id>/` with its `config.json` and an
/// empty `logs.ndjson`.
pub fn start_run<T: Serialize>(ctx: &RunContext, options: &T) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.runs_dir.join(format!("{timestamp}__run_{}", ctx.run_id));
    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        command: &ctx.command,
        options,
        git: collect_git_info(),
    };
    write_json(&root.join("config.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        logs_path,
        report_path: root.join("generation_report.json"),
        submission_path: root.join("submission_report.json"),
        root,
    })
}

pub fn write_report(paths: &RunPaths, report: &BatchReport) -> RegistryResult<()> {
    write_json(&paths.report_path, report)
}

pub fn write_submission(paths: &RunPaths, report: &SubmissionReport) -> RegistryResult<()> {
    write_json(&paths.submission_path, report)
}

fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
