//! Run mode - execute the frame pipeline on a still image

use anyhow::{bail, Context as _, Result};
use clap::Args;
use frame_inference_common::DownloadMode;
use frame_inference_core::image_io::{load_frame, save_frame};
use frame_inference_core::{
    ExecutionDevice, ExecutionReport, FrameOperator, FramePipeline, FrameSource, OutputTarget,
    ParameterSet, PipelineContext,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Args)]
pub struct RunCommand {
    /// Input image path
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Serialized model file (overrides ModelFile from --config)
    #[arg(short, long)]
    model: Option<String>,

    /// YAML parameter file with ModelFile and ImageDownload
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image download mode (Instant or Delayed)
    #[arg(long)]
    download: Option<String>,

    /// Execution device (auto, cpu, cuda)
    #[arg(long, default_value = "auto")]
    device: ExecutionDevice,

    /// Intra-op threads for the inference runtime
    #[arg(long)]
    threads: Option<usize>,

    /// Output image path
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Number of execute cycles to run
    #[arg(long, default_value = "1")]
    repeat: u32,

    /// Print the final execution report as JSON
    #[arg(long, default_value = "false")]
    json: bool,
}

impl RunCommand {
    fn parameters(&self) -> Result<ParameterSet> {
        let mut params = match &self.config {
            Some(path) => ParameterSet::from_yaml(path)
                .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
            None => ParameterSet::default(),
        };

        if let Some(model) = &self.model {
            params.model_file = model.clone();
        }
        if let Some(download) = &self.download {
            params.image_download = DownloadMode::from_host_str(download);
        }
        Ok(params)
    }

    pub fn execute(self) -> Result<()> {
        let params = self.parameters()?;
        let frame = load_frame(&self.input)
            .with_context(|| format!("Failed to read input frame {}", self.input.display()))?;

        let context = PipelineContext {
            device: self.device,
            intra_threads: self.threads,
        };
        let mut pipeline = FramePipeline::new(context);
        pipeline.configure(params);

        let geometry = pipeline
            .output_format(Some(&frame))
            .context("No output format without an input frame")?;
        let mut pixels = vec![0.0f32; geometry.sample_count()];
        info!("Processing {} frame from {}", geometry, self.input.display());

        let mut last: Option<ExecutionReport> = None;
        let start = Instant::now();
        for _ in 0..self.repeat.max(1) {
            let cycle_start = Instant::now();
            let report =
                pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));
            debug!(
                "execute #{} finished in {:.3}s ({:?})",
                report.execute_count,
                cycle_start.elapsed().as_secs_f64(),
                report.stage
            );
            let failed = !report.is_success();
            last = Some(report);
            if failed {
                break;
            }
        }
        let elapsed = start.elapsed();

        let report = last.context("No execute cycle ran")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        if let Some(err) = &report.error {
            bail!(
                "execute #{} failed (error {}): {}",
                report.execute_count,
                err.code().as_i32(),
                pipeline.report_error()
            );
        }

        save_frame(&self.output, frame.geometry(), &pixels)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        info!(
            "Wrote {} after {} cycle(s) in {:.3}s ({:.1} ms/frame)",
            self.output.display(),
            report.execute_count,
            elapsed.as_secs_f64(),
            elapsed.as_secs_f64() * 1000.0 / f64::from(self.repeat.max(1))
        );
        Ok(())
    }
}
