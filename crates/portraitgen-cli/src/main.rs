mod config;
mod registry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use config::{ConfigError, Settings, load_settings};
use portraitgen_comfy::{
    ComfyClient, PromptSink, SubmissionJob, SubmissionReport, SubmitOptions, WorkflowSpec,
    submit_batch,
};
use portraitgen_core::{CharacterTemplate, TemplateError, UnitTemplate};
use portraitgen_generate::{
    BatchReport, CsvSink, Dimension, EngineOptions, GenerationError, OutputRow, PortraitRow,
    PromptEngine, RolePromptRow, UnitRecord, UnitRow, read_records, read_rows,
};
use registry::{
    RunContext, RunPaths, init_console_logging, init_run_logging, start_run, write_report,
    write_submission,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("service unreachable: {0}")]
    Unreachable(String),
}

#[derive(Parser, Debug)]
#[command(name = "portraitgen", version, about = "Combinatorial portrait prompt generator")]
struct Cli {
    /// Optional TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long, global = true)]
    runs_dir: Option<PathBuf>,
    /// Run seed; drawn at random when omitted.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// ComfyUI base URL.
    #[arg(long, global = true)]
    comfy_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Traverse character combinations.
    Portraits(PortraitArgs),
    /// Random role prompts per identity.
    Roles(RoleArgs),
    /// One prompt per row of a unit table.
    Units(UnitArgs),
    /// Submit the rows of an existing CSV file.
    Submit(SubmitArgs),
    /// Check that the ComfyUI service answers.
    Probe,
}

#[derive(Args, Debug)]
struct PortraitArgs {
    #[arg(long, default_value = "portraits.csv")]
    out: PathBuf,
    /// Dimension values take a key, `all` or `random`.
    #[arg(long)]
    race: Option<Dimension>,
    #[arg(long)]
    hair_length: Option<Dimension>,
    #[arg(long)]
    hair_style: Option<Dimension>,
    #[arg(long)]
    hair_color: Option<Dimension>,
    #[arg(long)]
    eye_color: Option<Dimension>,
    #[arg(long)]
    body: Option<Dimension>,
    #[arg(long)]
    chest: Option<Dimension>,
    #[arg(long)]
    role: Option<Dimension>,
    #[arg(long)]
    shot: Option<String>,
    #[arg(long)]
    angle: Option<String>,
    #[arg(long)]
    composition: Option<String>,
    /// Upper bound on enumerated combinations.
    #[arg(long)]
    max: Option<usize>,
    #[arg(long, default_value_t = false)]
    no_alternate: bool,
    #[arg(long, default_value_t = false)]
    submit: bool,
}

#[derive(Args, Debug)]
struct RoleArgs {
    #[arg(long, default_value = "roles.csv")]
    out: PathBuf,
    #[arg(long)]
    identity: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    per_identity: Option<usize>,
    #[arg(long, default_value_t = false)]
    no_alternate: bool,
    #[arg(long, default_value_t = false)]
    submit: bool,
}

#[derive(Args, Debug)]
struct UnitArgs {
    /// Unit table CSV (`name, race, country, unit_type, level, avatar`).
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value = "units.csv")]
    out: PathBuf,
    #[arg(long)]
    race: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, default_value_t = false)]
    submit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Flavor {
    Portraits,
    Roles,
    Units,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// CSV written by an earlier run.
    #[arg(long)]
    input: PathBuf,
    #[arg(long, value_enum)]
    flavor: Flavor,
    /// Pause between submissions in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
}

/// Resolved options recorded in `config.json`.
#[derive(Debug, Serialize)]
struct RunOptions<'a, T: Serialize> {
    seed: Option<u64>,
    out: &'a Path,
    submit: bool,
    comfy_url: &'a str,
    batch: &'a T,
}

struct Session {
    settings: Settings,
    seed: Option<u64>,
    runs_dir: PathBuf,
    comfy_url: String,
}

impl Session {
    fn load(cli: &Cli) -> Result<Self, CliError> {
        let settings = load_settings(cli.config.as_deref())?;
        let seed = cli.seed.or(settings.seed);
        let runs_dir = cli
            .runs_dir
            .clone()
            .or_else(|| settings.runs_dir.clone())
            .unwrap_or_else(|| PathBuf::from("runs"));
        let comfy_url = cli
            .comfy_url
            .clone()
            .unwrap_or_else(|| settings.comfy.base_url.clone());
        Ok(Self {
            settings,
            seed,
            runs_dir,
            comfy_url,
        })
    }

    fn begin<T: Serialize>(
        &self,
        command: &str,
        out: &Path,
        submit: bool,
        batch: &T,
    ) -> Result<(RunContext, RunPaths), CliError> {
        let ctx = RunContext::new(command, &self.runs_dir);
        let options = RunOptions {
            seed: self.seed,
            out,
            submit,
            comfy_url: &self.comfy_url,
            batch,
        };
        let paths = start_run(&ctx, &options)?;
        init_run_logging(&paths.logs_path)?;
        tracing::info!(
            event = "run_started",
            run_id = %ctx.run_id,
            command,
            run_dir = %paths.root.display()
        );
        Ok((ctx, paths))
    }

    fn engine(&self, ctx: &RunContext) -> PromptEngine {
        PromptEngine::new(EngineOptions { seed: self.seed }).with_run_id(ctx.run_id.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(event = "run_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let session = Session::load(&cli)?;

    match cli.command {
        Command::Portraits(args) => run_portraits(&session, args).await,
        Command::Roles(args) => run_roles(&session, args).await,
        Command::Units(args) => run_units(&session, args).await,
        Command::Submit(args) => run_submit(&session, args).await,
        Command::Probe => run_probe(&session).await,
    }
}

async fn run_portraits(session: &Session, args: PortraitArgs) -> Result<(), CliError> {
    let mut traversal = session.settings.portraits.clone();
    let overrides = [
        (&mut traversal.race, args.race),
        (&mut traversal.hair_length, args.hair_length),
        (&mut traversal.hair_style, args.hair_style),
        (&mut traversal.hair_color, args.hair_color),
        (&mut traversal.eye_color, args.eye_color),
        (&mut traversal.body, args.body),
        (&mut traversal.chest, args.chest),
        (&mut traversal.role, args.role),
    ];
    for (slot, value) in overrides {
        if let Some(value) = value {
            *slot = value;
        }
    }
    traversal.shot = args.shot.or(traversal.shot);
    traversal.angle = args.angle.or(traversal.angle);
    traversal.composition = args.composition.or(traversal.composition);
    traversal.max_combinations = args.max.unwrap_or(traversal.max_combinations);
    if args.no_alternate {
        traversal.include_alternate = false;
    }

    let (ctx, paths) = session.begin("portraits", &args.out, args.submit, &traversal)?;
    let timer = Instant::now();
    let template = CharacterTemplate::builtin()?;

    let mut sink = CsvSink::<PortraitRow>::create(&args.out)?;
    let report = session.engine(&ctx).portraits(&template, &traversal, &mut sink)?;
    finish_generation(&paths, &report, &args.out)?;

    if args.submit {
        let comfy = &session.settings.comfy;
        let options = comfy.submit_options();
        submit_file::<PortraitRow>(session, &paths, &args.out, &comfy.character, &options).await?;
    }
    finish_run(timer);
    Ok(())
}

async fn run_roles(session: &Session, args: RoleArgs) -> Result<(), CliError> {
    let mut batch = session.settings.roles.clone();
    batch.identity = args.identity.or(batch.identity);
    batch.role = args.role.or(batch.role);
    batch.limit_per_identity = args.per_identity.unwrap_or(batch.limit_per_identity);
    if args.no_alternate {
        batch.include_alternate = false;
    }

    let (ctx, paths) = session.begin("roles", &args.out, args.submit, &batch)?;
    let timer = Instant::now();
    let template = CharacterTemplate::builtin()?;

    let mut sink = CsvSink::<RolePromptRow>::create(&args.out)?;
    let report = session.engine(&ctx).roles(&template, &batch, &mut sink)?;
    finish_generation(&paths, &report, &args.out)?;

    if args.submit {
        let comfy = &session.settings.comfy;
        let options = comfy.submit_options();
        submit_file::<RolePromptRow>(session, &paths, &args.out, &comfy.character, &options).await?;
    }
    finish_run(timer);
    Ok(())
}

async fn run_units(session: &Session, args: UnitArgs) -> Result<(), CliError> {
    let mut units = session.settings.units.clone();
    units.input = args.input.or(units.input);
    units.race = args.race.or(units.race);
    units.country = args.country.or(units.country);
    units.name = args.name.or(units.name);
    let input = units.input.clone().ok_or_else(|| {
        CliError::InvalidConfig("a unit table is required (--input or [units].input)".to_string())
    })?;

    let (ctx, paths) = session.begin("units", &args.out, args.submit, &units)?;
    let timer = Instant::now();
    let template = UnitTemplate::builtin()?;

    let records: Vec<UnitRecord> = read_records(&input)?;
    tracing::info!(event = "units_loaded", path = %input.display(), count = records.len());

    let mut sink = CsvSink::<UnitRow>::create(&args.out)?;
    let report = session
        .engine(&ctx)
        .units(&template, records, &units.filter(), &mut sink)?;
    finish_generation(&paths, &report, &args.out)?;

    if args.submit {
        let comfy = &session.settings.comfy;
        let options = comfy.submit_options();
        submit_file::<UnitRow>(session, &paths, &args.out, &comfy.unit, &options).await?;
    }
    finish_run(timer);
    Ok(())
}

async fn run_submit(session: &Session, args: SubmitArgs) -> Result<(), CliError> {
    let (_ctx, paths) = session.begin("submit", &args.input, true, &args.flavor)?;
    let timer = Instant::now();
    let mut options = session.settings.comfy.submit_options();
    if let Some(delay_ms) = args.delay_ms {
        options.delay = Duration::from_millis(delay_ms);
    }
    let comfy = &session.settings.comfy;

    match args.flavor {
        Flavor::Portraits => {
            submit_file::<PortraitRow>(session, &paths, &args.input, &comfy.character, &options)
                .await?
        }
        Flavor::Roles => {
            submit_file::<RolePromptRow>(session, &paths, &args.input, &comfy.character, &options)
                .await?
        }
        Flavor::Units => {
            submit_file::<UnitRow>(session, &paths, &args.input, &comfy.unit, &options).await?
        }
    };
    finish_run(timer);
    Ok(())
}

async fn run_probe(session: &Session) -> Result<(), CliError> {
    init_console_logging()?;
    let client = ComfyClient::new(&session.comfy_url);
    ensure_reachable(&client).await?;

    match client.queue_status().await {
        Ok(queue) => {
            tracing::info!(
                event = "probe_ok",
                base_url = %client.base_url(),
                running = queue.running,
                pending = queue.pending
            );
            println!(
                "{} reachable: {} running, {} pending",
                client.base_url(),
                queue.running,
                queue.pending
            );
        }
        Err(err) => {
            tracing::warn!(event = "queue_status_failed", error = %err);
            println!("{} reachable", client.base_url());
        }
    }
    Ok(())
}

async fn ensure_reachable(client: &ComfyClient) -> Result<(), CliError> {
    if client.probe().await {
        Ok(())
    } else {
        Err(CliError::Unreachable(format!("ComfyUI at {}", client.base_url())))
    }
}

fn finish_generation(paths: &RunPaths, report: &BatchReport, out: &Path) -> Result<(), CliError> {
    write_report(paths, report)?;
    tracing::info!(
        event = "csv_written",
        path = %out.display(),
        rows = report.rows_written,
        skipped = report.skipped,
        truncated = report.truncated
    );
    println!(
        "{} rows written to {} (run {})",
        report.rows_written,
        out.display(),
        paths.root.display()
    );
    Ok(())
}

async fn submit_file<R: OutputRow>(
    session: &Session,
    paths: &RunPaths,
    csv: &Path,
    spec: &WorkflowSpec,
    options: &SubmitOptions,
) -> Result<SubmissionReport, CliError> {
    let rows: Vec<R> = read_rows(csv)?;
    let jobs: Vec<SubmissionJob> = rows.iter().map(SubmissionJob::from_row).collect();
    let client = ComfyClient::new(&session.comfy_url);
    tracing::info!(
        event = "submission_started",
        base_url = %client.base_url(),
        jobs = jobs.len()
    );

    let report = submit_batch(&client, spec, &jobs, options).await;
    write_submission(paths, &report)?;
    println!(
        "{} of {} jobs queued ({} failed)",
        report.succeeded, report.attempted, report.failed
    );
    Ok(report)
}

fn finish_run(timer: Instant) {
    let duration_ms = timer.elapsed().as_millis() as u64;
    tracing::info!(event = "run_finished", status = "success", duration_ms);
}
