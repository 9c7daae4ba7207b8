use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use crate::analysis::AnalysisKind;
use crate::campaign::config::Campaign;
use crate::slurm::job::{self, JobSpec};
use crate::slurm::submit::{self, BatchReport};

mod analysis;
mod campaign;
mod slurm;

/// Submit observation-impact (Jo-diff) analysis jobs to SLURM, one per
/// assimilation cycle
#[derive(Debug, Parser)]
#[command(name = "jodispatch", version, about)]
struct Args {
    /// Campaign configuration file (JSON)
    #[arg(short, long)]
    config: PathBuf,
    /// Directory where figures/, logs/, pickle/ and jobs/ are created
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,
    /// Override the campaign's analysis kind
    #[arg(long, value_enum)]
    analysis: Option<AnalysisKind>,
    /// Render and stage job scripts without submitting anything
    #[arg(long)]
    dry_run: bool,
}

/// Directory that staged scripts, logs and analysis outputs live under
pub struct Workspace {
    pub path: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    info!("jodispatch starting up");

    let args = Args::parse();

    let mut campaign = Campaign::load(&args.config)
        .with_context(|| format!("Can't load campaign {}", args.config.display()))?;
    if let Some(kind) = args.analysis {
        info!("Analysis kind overridden on the command line: {kind}");
        campaign.analysis = kind;
    }

    // sbatch --output wants an absolute log path
    let path = args.work_dir.canonicalize().with_context(|| {
        format!("Can't resolve working directory {}", args.work_dir.display())
    })?;
    let workspace = Workspace { path };
    job::prepare_workspace(&workspace).context("Can't prepare workspace directories")?;

    let cycles = campaign.cycles();
    info!(
        "Campaign: {} analysis, {} cycles, data root {}",
        campaign.analysis,
        cycles.len(),
        campaign.data_root
    );

    let mut report = BatchReport::default();
    for cycle in cycles {
        let spec = JobSpec::new(&campaign, cycle);

        let script = match spec.stage(&campaign, &workspace) {
            Ok(script) => script,
            Err(err) => {
                report.record_failed(&spec.name, format!("staging failed: {err}"));
                continue;
            }
        };

        if args.dry_run {
            info!("Dry run: staged {} without submitting", script.path.display());
            continue;
        }

        match submit::submit(&campaign.sbatch, &script) {
            Ok(job_id) => report.record_submitted(&spec.name, &job_id),
            Err(err) => report.record_failed(&spec.name, err.to_string()),
        }
    }

    report.summarise();
    if !report.all_submitted() {
        bail!("{} job submissions failed", report.failed_count());
    }

    Ok(())
}
