use std::{fs, io};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::campaign::config::Campaign;
use crate::campaign::cycle::Cycle;
use crate::Workspace;

/// Output directories every job expects under the workspace.
///
/// `figures/` and `pickle/` are written by the analysis programs, `logs/`
/// by the scheduler, `jobs/` by us (rendered scripts).
static WORKSPACE_DIRS: [&str; 4] = ["figures", "logs", "pickle", "jobs"];

/// Per-cycle job parameters, resolved once from the campaign.
///
/// Everything the wrapper script needs is fixed here at enumeration time;
/// staging and submission only ever read it.
pub struct JobSpec {
    pub cycle: Cycle,
    /// SLURM job name, `<job_tag>_<cycle id>`
    pub name: String,
    /// Resolved diagnostic directory, always with a trailing separator
    pub data_path: String,
    /// Domain-filter expression, an exact copy of the campaign's
    pub domain: String,
    /// Render the trailing detail argument in the invocation line
    save_detail: bool,
}

/// A JobScript is the path to a rendered job script that's submitted to
/// SLURM via sbatch
pub struct JobScript {
    pub path: PathBuf,
}

impl JobSpec {
    pub fn new(campaign: &Campaign, cycle: Cycle) -> JobSpec {
        let name = format!("{}_{}", campaign.job_tag, cycle.id());
        let data_path = format!("{}/rrfs.{}/", campaign.data_root.trim_end_matches('/'), cycle.date());

        let mut save_detail = campaign.save_detail;
        if save_detail && !campaign.analysis.takes_detail_flag() {
            warn!("save_detail is set but the {} program takes no detail argument, ignoring", campaign.analysis);
            save_detail = false;
        }

        JobSpec {
            cycle,
            name,
            data_path,
            domain: campaign.domain.clone(),
            save_detail,
        }
    }

    /// Workspace-relative log path, `logs/<job name>.log`
    pub fn log_path(&self) -> PathBuf {
        Path::new("logs").join(format!("{}.log", self.name))
    }

    /// Workspace-relative script path, `jobs/<job name>.sh`
    pub fn script_path(&self) -> PathBuf {
        Path::new("jobs").join(format!("{}.sh", self.name))
    }

    /// Render this job's script into `jobs/` and clear its stale artifacts.
    ///
    /// The log from any earlier run of the same job name is removed so the
    /// scheduler starts it fresh instead of leaving a misleading old one
    /// next to the new job's output.
    pub fn stage(&self, campaign: &Campaign, wd: &Workspace) -> Result<JobScript, io::Error> {
        let log_path = wd.path.join(self.log_path());
        let script_path = wd.path.join(self.script_path());
        remove_stale(&log_path)?;
        remove_stale(&script_path)?;

        let header = render_header(self, campaign, &log_path);
        let env = render_env(self);
        let analysis = render_analysis(self, campaign, &wd.path);
        let job = JobTemplate { header, env, analysis };

        job.write(&script_path)?;
        info!("Staged job {} at {}", self.name, script_path.display());
        Ok(JobScript { path: script_path })
    }
}

/// Create the workspace output directories, leaving existing ones untouched
pub fn prepare_workspace(wd: &Workspace) -> Result<(), io::Error> {
    for dir in WORKSPACE_DIRS {
        fs::create_dir_all(wd.path.join(dir))?;
    }
    Ok(())
}

/// Remove a stale file from an earlier run; missing is fine
fn remove_stale(path: &Path) -> Result<(), io::Error> {
    match fs::remove_file(path) {
        Ok(_) => {
            info!("Removed stale file {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// All rendered sections of one job script
struct JobTemplate {
    header: Header,
    env: EnvVars,
    analysis: Analysis,
}

impl JobTemplate {
    /// Write the complete job script to disk by appending rendered template
    /// sections to the file
    fn write(self, out_path: &Path) -> Result<(), io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(out_path)?;

        // order is important when writing the file
        let contents = [
            self.header.content,
            self.env.content,
            self.analysis.content,
        ];

        for content in contents.iter() {
            file.write_all(content.as_bytes())?;
        }

        Ok(())
    }
}

/// Rendered SBATCH header
///
/// Job options are parsed by sbatch from #SBATCH lines before the first
/// executable command. Name, log destination and the resource requests
/// (walltime, memory, account, partition) come from the job spec and the
/// campaign; `--ntasks=1` is fixed because every analysis is a single task.
struct Header {
    content: String,
}

/// Rendered environment variables section
///
/// These exports are the contract with the analysis program: the wrapper
/// forwards them positionally, so their values must reach the node
/// byte-for-byte as configured.
struct EnvVars {
    content: String,
}

/// Rendered analysis commands
///
/// Module loads, optional conda activation, and exactly one analysis
/// invocation line.
struct Analysis {
    content: String,
}

/// Rendering context for header
#[derive(Serialize)]
struct HeaderContext {
    name: String,
    log_path: String,
    time_limit: String,
    memory: String,
    account: String,
    partition: String,
    time_now: String,
}

/// Rendering context for environment variables
#[derive(Serialize)]
struct EnvContext {
    year: String,
    month: String,
    day: String,
    hour: String,
    data_path: String,
    domain: String,
}

/// Rendering context for analysis commands
#[derive(Serialize)]
struct AnalysisContext {
    modules: String,
    work_dir: String,
    python: String,
    script: String,
    detail_arg: String,
}

/// Build a TinyTemplate that renders values verbatim.
///
/// The default formatter HTML-escapes; a domain expression like
/// `anl_latitude > 20.0` must not come out as `&gt;`.
fn template(name: &'static str, text: &'static str) -> TinyTemplate<'static> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template(name, text).expect("Template");
    tt
}

/// Single-quote a value for POSIX shell, preserving embedded single quotes
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render the SBATCH header using TinyTemplate
fn render_header(spec: &JobSpec, campaign: &Campaign, log_path: &Path) -> Header {
    /// included header template
    static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
    let tt = template("header", HEADER);

    let context = HeaderContext {
        name: spec.name.clone(),
        log_path: log_path.display().to_string(),
        time_limit: campaign.resources.time.clone(),
        memory: campaign.resources.memory.clone(),
        account: campaign.resources.account.clone(),
        partition: campaign.resources.partition.clone(),
        time_now: Utc::now().to_string(),
    };

    Header { content: tt.render("header", &context).expect("Rendered header") }
}

/// Render the environment variable exports using TinyTemplate
fn render_env(spec: &JobSpec) -> EnvVars {
    /// included environment variables template
    static ENV: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/env.txt"));
    let tt = template("env", ENV);

    let context = EnvContext {
        year: spec.cycle.yyyy(),
        month: spec.cycle.mm(),
        day: spec.cycle.dd(),
        hour: spec.cycle.hh(),
        data_path: shell_quote(&spec.data_path),
        domain: shell_quote(&spec.domain),
    };

    EnvVars { content: tt.render("env", &context).expect("Rendered environment") }
}

/// Render the analysis commands using TinyTemplate
fn render_analysis(spec: &JobSpec, campaign: &Campaign, work_dir: &Path) -> Analysis {
    /// included analysis template
    static ANALYSIS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/analysis.txt"));
    let tt = template("analysis", ANALYSIS);

    let mut module_lines: Vec<String> = Vec::new();
    if !campaign.modules.is_empty() {
        module_lines.push("module purge".to_string());
        for module in &campaign.modules {
            module_lines.push(format!("module load {module}"));
        }
    }
    if let Some(conda_env) = &campaign.conda_env {
        module_lines.push(format!("conda activate {conda_env}"));
    }

    let script = format!("{}/{}", campaign.scripts_dir.trim_end_matches('/'), campaign.analysis.script());
    let detail_arg = if spec.save_detail { " 1".to_string() } else { String::new() };

    let context = AnalysisContext {
        modules: module_lines.join("\n"),
        work_dir: shell_quote(&work_dir.display().to_string()),
        python: campaign.python.clone(),
        script,
        detail_arg,
    };

    Analysis { content: tt.render("analysis", &context).expect("Rendered analysis") }
}
