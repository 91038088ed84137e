use std::time::{Duration, Instant};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::control::command::Command;
use crate::detection::domain::face_detector::{FaceCandidate, FaceDetector};
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::identity_class::IdentityClass;
use crate::shared::frame::Frame;

use super::overlay::{OverlayMessage, OverlayTimer};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::position_report::PositionReport;
use super::recognition_config::RecognitionConfig;

/// What one call to [`FrameProcessor::process`] produced.
pub struct FrameOutcome {
    /// The annotated frame, still owned; the caller must dispose of it.
    pub frame: Frame,
    pub report: PositionReport,
    /// Command acted on after guarding-mode escalation.
    pub command: Command,
    /// Guarding mode forced `Recognize` because a face appeared.
    pub escalated: bool,
    pub faces: usize,
}

/// Per-frame decision logic of the frame worker.
///
/// Holds the only state that survives between frames: whether the previous
/// frame had an actionable face, the foe/friend outcome of the current
/// appearance, and the overlay timer. A face is actionable only when
/// detection yields exactly one candidate.
pub struct FrameProcessor {
    detector: Box<dyn FaceDetector>,
    recognizer: Box<dyn FaceRecognizer>,
    annotator: Box<dyn FrameAnnotator>,
    logger: Box<dyn PipelineLogger>,
    overlay: OverlayTimer,
    delete_settle: Duration,
    face_present: bool,
    identified: Option<IdentityClass>,
    frames_processed: usize,
}

impl FrameProcessor {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        recognizer: Box<dyn FaceRecognizer>,
        annotator: Box<dyn FrameAnnotator>,
        config: &RecognitionConfig,
    ) -> Self {
        Self {
            detector,
            recognizer,
            annotator,
            logger: Box::new(NullPipelineLogger),
            overlay: OverlayTimer::new(config.overlay_frames),
            delete_settle: config.delete_settle(),
            face_present: false,
            identified: None,
            frames_processed: 0,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Loads the recognizer's persisted identities. Failures are logged and
    /// leave the recognizer empty.
    pub fn load_enrollments(&mut self) -> usize {
        match self.recognizer.load_enrollments() {
            Ok(count) => {
                self.logger.info(&format!("Loaded {count} enrolled IDs"));
                count
            }
            Err(e) => {
                log::error!("Failed to load enrolled IDs: {e}");
                0
            }
        }
    }

    /// True iff the last processed frame had an actionable face.
    pub fn face_present(&self) -> bool {
        self.face_present
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    pub fn recognizer(&self) -> &dyn FaceRecognizer {
        self.recognizer.as_ref()
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    pub fn process(&mut self, latched: Command, mut frame: Frame, guarding: bool) -> FrameOutcome {
        let started = Instant::now();
        let candidates = match self.detector.detect(&frame) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("Detection failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };
        self.logger.timing("detect", elapsed_ms(started));
        self.logger.metric("faces", candidates.len() as f64);

        let mut command = latched;
        let mut escalated = false;
        let face = match candidates.as_slice() {
            [face] => Some(face),
            _ => None,
        };

        let started = Instant::now();
        if let Some(face) = face {
            if !self.face_present && guarding {
                escalated = true;
                command = Command::Recognize;
            }
            self.face_present = true;
            self.dispatch(command, &frame, face, &candidates);
        } else {
            self.face_present = false;
            self.identified = None;
        }
        self.logger.timing("dispatch", elapsed_ms(started));

        let started = Instant::now();
        self.render_overlay(&mut frame);
        if !candidates.is_empty() {
            log_detections(&candidates);
            if let Err(e) = self.annotator.draw_detections(&mut frame, &candidates) {
                log::warn!("Skipping detection drawing: {e}");
            }
        }
        self.logger.timing("annotate", elapsed_ms(started));

        let report = match (self.identified, face) {
            (Some(class), Some(face)) => PositionReport::located(class, &frame, face),
            _ => PositionReport::none(),
        };

        self.frames_processed += 1;
        self.logger.frame_done(self.frames_processed);

        FrameOutcome {
            frame,
            report,
            command,
            escalated,
            faces: candidates.len(),
        }
    }

    fn dispatch(&mut self, command: Command, frame: &Frame, face: &FaceCandidate, all: &[FaceCandidate]) {
        match command {
            Command::EnrollAsFoe => self.enroll(frame, face, IdentityClass::Foe),
            Command::EnrollAsFriend => self.enroll(frame, face, IdentityClass::Friend),
            Command::Recognize => {
                log_detections(all);
                self.recognize(frame, face);
            }
            Command::Delete => self.delete(),
            Command::Detect => {}
        }
    }

    fn enroll(&mut self, frame: &Frame, face: &FaceCandidate, class: IdentityClass) {
        match self.recognizer.enroll(frame, &face.keypoints, class) {
            Ok(id) => {
                log::info!(target: "enroll", "ID {id} is enrolled as {class}");
                self.overlay.set(OverlayMessage::enrolled(class, id));
            }
            Err(e) => log::error!(target: "enroll", "Enrollment as {class} failed: {e}"),
        }
    }

    fn recognize(&mut self, frame: &Frame, face: &FaceCandidate) {
        let outcome = match self.recognizer.recognize(frame, &face.keypoints) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!(target: "recognize", "Recognition failed: {e}");
                self.identified = None;
                return;
            }
        };

        let class_name = IdentityClass::from_label(&outcome.label)
            .map(|c| c.to_string())
            .unwrap_or_else(|| outcome.label.clone());
        if outcome.is_match() {
            log::info!(
                target: "recognize",
                "Similarity: {:.4}, Match ID: {}, {class_name}",
                outcome.similarity,
                outcome.id
            );
        } else {
            log::error!(
                target: "recognize",
                "Similarity: {:.4}, Match ID: {}, {class_name}",
                outcome.similarity,
                outcome.id
            );
        }

        self.identified = outcome.matched_class();
        self.overlay.set(OverlayMessage::recognized(&outcome));
    }

    fn delete(&mut self) {
        std::thread::sleep(self.delete_settle);
        match self.recognizer.delete_all() {
            Ok(remaining) => {
                log::error!(target: "delete", "{remaining} IDs left");
                self.identified = None;
                self.overlay.set(OverlayMessage::deleted(remaining));
            }
            Err(e) => log::error!(target: "delete", "Deleting enrolled IDs failed: {e}"),
        }
    }

    fn render_overlay(&mut self, frame: &mut Frame) {
        if let Some(message) = self.overlay.current() {
            if let Err(e) = self.annotator.print_text(frame, message.color, &message.text) {
                log::warn!("Skipping overlay: {e}");
            }
        }
        self.overlay.advance();
    }
}

fn log_detections(candidates: &[FaceCandidate]) {
    for (i, c) in candidates.iter().enumerate() {
        let (nx, ny) = c.keypoints.nose();
        log::debug!(
            "[{i}] score: {:.3}, box: [{:.0}, {:.0}, {:.0}, {:.0}], nose: ({nx:.0}, {ny:.0})",
            c.score,
            c.bbox.x1,
            c.bbox.y1,
            c.bbox.x2,
            c.bbox.y2
        );
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
