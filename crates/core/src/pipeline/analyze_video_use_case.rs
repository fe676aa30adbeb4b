use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::pipeline::detection_worker::{Admission, DetectionWorker};
use crate::video::domain::frame_source::FrameSource;

/// Counts for one analysis run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub frames_read: usize,
    pub frames_accepted: usize,
    pub frames_dropped: usize,
    pub cancelled: bool,
}

/// Feeds every frame of a video through a detection worker.
///
/// Single use: `execute` consumes the frame source. Cancellation (the
/// shared flag, or the progress callback returning `false`) aborts the
/// worker, so no result is dispatched once `execute` returns.
pub struct AnalyzeVideoUseCase {
    source: Option<Box<dyn FrameSource>>,
    worker: Arc<DetectionWorker>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl AnalyzeVideoUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        worker: Arc<DetectionWorker>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            worker,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn worker(&self) -> &Arc<DetectionWorker> {
        &self.worker
    }

    pub fn execute(&mut self, path: &Path) -> Result<AnalysisSummary, Box<dyn std::error::Error>> {
        let mut source = self.source.take().ok_or("Analysis already executed")?;
        let info = source.open(path)?;
        log::info!(
            "Analyzing {} ({}x{}, {:.2} fps, {} frames)",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.total_frames
        );

        if let Err(e) = self.worker.start() {
            source.close();
            return Err(e.into());
        }

        let result = self.feed(source.as_mut(), info.total_frames);
        source.close();

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                self.worker.abort();
                return Err(e);
            }
        };

        if summary.cancelled {
            self.worker.abort();
            log::info!("Analysis cancelled after {} frames", summary.frames_read);
        } else {
            self.worker.finish()?;
        }
        Ok(summary)
    }

    fn feed(
        &self,
        source: &mut dyn FrameSource,
        total_frames: usize,
    ) -> Result<AnalysisSummary, Box<dyn std::error::Error>> {
        let mut summary = AnalysisSummary::default();

        for frame in source.frames() {
            if self.cancelled.load(Ordering::Relaxed) {
                summary.cancelled = true;
                break;
            }
            let frame = frame?;
            summary.frames_read += 1;

            match self.worker.process(frame) {
                Ok(Admission::Accepted) => summary.frames_accepted += 1,
                Ok(Admission::Dropped | Admission::Ignored) => summary.frames_dropped += 1,
                // The loop ended on its own; stopping reports why.
                Err(e) => {
                    self.worker.stop()?;
                    return Err(e.into());
                }
            }

            if let Some(ref cb) = self.on_progress {
                if !cb(summary.frames_read, total_frames) {
                    self.cancelled.store(true, Ordering::Relaxed);
                    summary.cancelled = true;
                    break;
                }
            }
        }

        Ok(summary)
    }
}
