use std::io;
use std::process::{Command, ExitStatus};
use std::string::FromUtf8Error;

use log::{info, warn};
use thiserror::Error;

use crate::slurm::job::JobScript;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("can't run {sbatch}: {source}")]
    Spawn { sbatch: String, source: io::Error },
    #[error("sbatch exited with {status}: {stderr}")]
    Rejected { status: ExitStatus, stderr: String },
    #[error("sbatch printed a job id that isn't UTF-8: {0}")]
    JobId(#[from] FromUtf8Error),
}

/// Submit a staged script and return the SLURM job id.
///
/// `--parsable` makes sbatch print `jobid[;cluster]` on stdout; only the id
/// field is kept. A rejected submission carries sbatch's stderr as the
/// diagnostic.
pub fn submit(sbatch: &str, script: &JobScript) -> Result<String, SubmitError> {
    let mut cmd = Command::new(sbatch);
    cmd.arg("--parsable").arg(&script.path);
    info!("Running sbatch process");
    info!("{:?}", &cmd);

    let output = cmd
        .output()
        .map_err(|source| SubmitError::Spawn { sbatch: sbatch.to_string(), source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(SubmitError::Rejected { status: output.status, stderr });
    }

    let stdout = String::from_utf8(output.stdout)?;
    let job_id = stdout.trim().split(';').next().unwrap_or_default().to_string();
    Ok(job_id)
}

/// Outcome of one sweep of submissions.
///
/// The driver never stops on a failed submission; it records the outcome
/// and moves to the next cycle, then reports the whole batch at the end
/// instead of leaving success a matter of scrolling back through logs.
#[derive(Default)]
pub struct BatchReport {
    submitted: Vec<(String, String)>,
    failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn record_submitted(&mut self, name: &str, job_id: &str) {
        info!("Submitted {name} as SLURM job {job_id}");
        self.submitted.push((name.to_string(), job_id.to_string()));
    }

    pub fn record_failed(&mut self, name: &str, diagnostic: String) {
        warn!("Submission of {name} failed: {diagnostic}");
        self.failed.push((name.to_string(), diagnostic));
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn all_submitted(&self) -> bool {
        self.failed.is_empty()
    }

    /// Log the end-of-run summary, one warn line per failure
    pub fn summarise(&self) {
        info!("Batch summary: {} submitted, {} failed", self.submitted.len(), self.failed.len());
        for (name, diagnostic) in &self.failed {
            warn!("{name}: {diagnostic}");
        }
    }
}
