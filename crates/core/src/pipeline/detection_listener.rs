use crossbeam_channel::{Receiver, Sender};

use crate::shared::detection_result::DetectionResult;
use crate::shared::frame::Frame;

/// Consumer callback the detection worker dispatches each result to.
///
/// Called on the worker's own thread, once per processed frame, in
/// submission order. Implementations that need results on another thread
/// must hand them off without reordering; see [`ChannelListener`].
pub trait DetectionListener: Send {
    fn on_result(&mut self, frame: Frame, result: DetectionResult);
}

/// One processed frame with its detection result.
#[derive(Clone, Debug)]
pub struct DetectionEvent {
    pub frame: Frame,
    pub result: DetectionResult,
}

/// Marshals results onto a channel drained by the consumer's thread.
///
/// The channel is FIFO, so the consumer applies results in the order the
/// worker produced them.
pub struct ChannelListener {
    tx: Sender<DetectionEvent>,
}

impl ChannelListener {
    /// Listener plus the receiving end for the consumer.
    pub fn new() -> (Self, Receiver<DetectionEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: Sender<DetectionEvent>) -> Self {
        Self { tx }
    }
}

impl DetectionListener for ChannelListener {
    fn on_result(&mut self, frame: Frame, result: DetectionResult) {
        if self.tx.send(DetectionEvent { frame, result }).is_err() {
            log::debug!("Result consumer disconnected; dropping result");
        }
    }
}
