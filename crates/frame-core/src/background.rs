//! Background execution of the frame pipeline on a worker thread
//!
//! ```text
//! [Host Thread] --FrameJob--> [Worker Thread] --CompletedFrame--> [Host Thread]
//!                              (FramePipeline)
//! ```
//!
//! Settings travel with every job as an immutable snapshot, so the worker
//! never reads shared mutable configuration. Both queues are bounded. When
//! the completed queue is full the worker drops the oldest result: the host
//! only ever displays the most recent frame.

use crate::frame::OwnedFrame;
use crate::params::ParameterSet;
use crate::pipeline::{ExecutionReport, FramePipeline, FrameSource, OutputTarget};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use frame_inference_common::{FrameGeometry, ProcessingError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// One frame to process with the settings in effect when it was captured
#[derive(Debug, Clone)]
pub struct FrameJob {
    pub settings: Arc<ParameterSet>,
    pub frame: OwnedFrame,
}

/// Output of one background execute cycle
#[derive(Debug, Clone)]
pub struct CompletedFrame {
    pub geometry: FrameGeometry,
    /// RGBA f32 samples; untouched zeros when the cycle failed
    pub pixels: Vec<f32>,
    pub report: ExecutionReport,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Frame queue is full")]
    QueueFull,

    #[error("Background worker has stopped")]
    Disconnected,
}

/// Handle to a pipeline running on its own thread
pub struct BackgroundPipeline {
    job_tx: Option<Sender<FrameJob>>,
    done_rx: Receiver<CompletedFrame>,
    worker: Option<JoinHandle<()>>,
    latest: Option<CompletedFrame>,
}

impl BackgroundPipeline {
    /// Move `pipeline` onto a worker thread
    ///
    /// `capacity` bounds both the pending job queue and the completed queue
    /// (minimum 1).
    pub fn spawn(pipeline: FramePipeline, capacity: usize) -> Result<Self, ProcessingError> {
        let capacity = capacity.max(1);
        let (job_tx, job_rx) = bounded::<FrameJob>(capacity);
        let (done_tx, done_rx) = bounded::<CompletedFrame>(capacity);
        let overflow_rx = done_rx.clone();

        let worker = thread::Builder::new()
            .name("frame-inference-worker".to_string())
            .spawn(move || worker_loop(pipeline, job_rx, done_tx, overflow_rx))?;

        Ok(Self {
            job_tx: Some(job_tx),
            done_rx,
            worker: Some(worker),
            latest: None,
        })
    }

    /// Queue a frame without blocking
    pub fn try_submit(&self, job: FrameJob) -> Result<(), SubmitError> {
        let tx = self.job_tx.as_ref().ok_or(SubmitError::Disconnected)?;
        tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Disconnected(_) => SubmitError::Disconnected,
        })
    }

    /// Most recent completed frame, draining anything newer first
    pub fn latest_completed(&mut self) -> Option<&CompletedFrame> {
        if let Some(newest) = self.done_rx.try_iter().last() {
            self.latest = Some(newest);
        }
        self.latest.as_ref()
    }

    /// Wait up to `timeout` for a new completed frame, then return the latest
    pub fn wait_completed(&mut self, timeout: Duration) -> Option<&CompletedFrame> {
        match self.done_rx.recv_timeout(timeout) {
            Ok(frame) => self.latest = Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        self.latest_completed()
    }

    /// Close the job queue and wait for the worker to exit
    pub fn shutdown(mut self) -> Result<(), ProcessingError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), ProcessingError> {
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| ProcessingError::Other("Inference worker panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for BackgroundPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Background pipeline shutdown failed: {}", e);
        }
    }
}

fn worker_loop(
    mut pipeline: FramePipeline,
    job_rx: Receiver<FrameJob>,
    done_tx: Sender<CompletedFrame>,
    overflow_rx: Receiver<CompletedFrame>,
) {
    debug!("Inference worker started");

    for job in job_rx.iter() {
        if pipeline.params() != job.settings.as_ref() {
            pipeline.set_params(ParameterSet::clone(&job.settings));
        }

        let geometry = job.frame.geometry();
        let mut pixels = vec![0.0f32; geometry.sample_count()];
        let report = pipeline.execute(
            Some(&job.frame),
            &mut OutputTarget::new(geometry, &mut pixels),
        );

        let mut completed = CompletedFrame {
            geometry,
            pixels,
            report,
        };

        loop {
            match done_tx.try_send(completed) {
                Ok(()) => break,
                Err(TrySendError::Full(frame)) => {
                    trace!("Completed queue full, dropping oldest frame");
                    let _ = overflow_rx.try_recv();
                    completed = frame;
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!("Completed queue closed, stopping worker");
                    return;
                }
            }
        }
    }

    pipeline.release();
    debug!("Inference worker stopped");
}
