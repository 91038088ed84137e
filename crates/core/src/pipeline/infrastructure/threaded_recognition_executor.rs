use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::control::command_listener::spawn_command_listener;
use crate::control::event_latch::EventLatch;
use crate::pipeline::frame_disposition::{DisposeError, FrameDisposition};
use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::pipeline_executor::{
    GuardingMode, RecognitionChannels, RecognitionExecutor, RecognitionHandle,
};
use crate::pipeline::position_report::PositionReport;
use crate::pipeline::recognition_config::RecognitionConfig;
use crate::shared::frame::Frame;
use crate::shared::shutdown::{shutdown_channel, ShutdownSignal};

/// Runs the pipeline on two dedicated threads.
///
/// Layout: `commands → listener → latch`, `frames → worker → sink / hook`,
/// `worker → results`.
///
/// The worker blocks only on the frame source and on full output queues;
/// both waits also watch the shutdown signal.
pub struct ThreadedRecognitionExecutor {
    return_frames: bool,
}

impl ThreadedRecognitionExecutor {
    pub fn new(return_frames: bool) -> Self {
        Self { return_frames }
    }

    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self::new(config.return_frames)
    }
}

impl Default for ThreadedRecognitionExecutor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RecognitionExecutor for ThreadedRecognitionExecutor {
    fn start(
        &self,
        processor: FrameProcessor,
        channels: RecognitionChannels,
        guarding: GuardingMode,
    ) -> Result<RecognitionHandle, Box<dyn std::error::Error>> {
        let RecognitionChannels {
            frames,
            commands,
            frame_sink,
            results,
            return_hook,
        } = channels;

        let latch = Arc::new(EventLatch::new());
        let (trigger, signal) = shutdown_channel();
        let disposition = FrameDisposition::select(frame_sink, return_hook, self.return_frames);
        log::debug!("Frame disposition: {:?}", disposition.kind());

        let command_listener = match commands {
            Some(commands) => Some(spawn_command_listener(
                commands,
                latch.clone(),
                signal.clone(),
            )?),
            None => {
                log::info!("No command channel, running on guarding mode only");
                None
            }
        };

        let worker = FrameWorker {
            processor,
            latch: latch.clone(),
            frames,
            disposition,
            results,
            guarding,
            shutdown: signal,
        };
        let frame_worker = std::thread::Builder::new()
            .name("frame-worker".into())
            .spawn(move || worker.run())?;

        Ok(RecognitionHandle::new(
            latch,
            trigger,
            frame_worker,
            command_listener,
        ))
    }
}

/// Everything the frame worker owns for its lifetime.
struct FrameWorker {
    processor: FrameProcessor,
    latch: Arc<EventLatch>,
    frames: Receiver<Frame>,
    disposition: FrameDisposition,
    results: Option<Sender<PositionReport>>,
    guarding: GuardingMode,
    shutdown: ShutdownSignal,
}

impl FrameWorker {
    fn run(mut self) -> FrameProcessor {
        self.processor.load_enrollments();

        loop {
            let command = self.latch.consume_and_reset();

            let frame = crossbeam_channel::select! {
                recv(self.frames) -> msg => match msg {
                    Ok(frame) => frame,
                    Err(_) => {
                        log::info!("Frame source closed");
                        break;
                    }
                },
                recv(self.shutdown.receiver()) -> _ => break,
            };

            let guarding = self.guarding.is_enabled();
            let outcome = self.processor.process(command, frame, guarding);

            match self.disposition.dispose(outcome.frame, &self.shutdown) {
                Ok(_) => {}
                Err(DisposeError::SinkClosed) => {
                    log::warn!("Frame sink closed, stopping frame worker");
                    break;
                }
                Err(DisposeError::Interrupted) => break,
            }

            if guarding && !self.emit(outcome.report) {
                break;
            }
        }

        self.processor
    }

    /// Sends the report to the result sink, if any. Returns false when
    /// shutdown interrupted the send.
    fn emit(&mut self, report: PositionReport) -> bool {
        let Some(results) = self.results.as_ref() else {
            return true;
        };

        let started = Instant::now();
        let delivered = crossbeam_channel::select! {
            send(results, report) -> res => res.is_ok(),
            recv(self.shutdown.receiver()) -> _ => return false,
        };
        if !delivered {
            log::warn!("Result sink closed, no further reports will be emitted");
            self.results = None;
        }
        self.processor
            .logger_mut()
            .timing("emit", started.elapsed().as_secs_f64() * 1000.0);
        true
    }
}
