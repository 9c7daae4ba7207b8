//! Render per-cycle job scripts and hand them to SLURM

/// Resolve job parameters and render job scripts from templates
pub mod job;

/// Run sbatch and account for submission outcomes
pub mod submit;
