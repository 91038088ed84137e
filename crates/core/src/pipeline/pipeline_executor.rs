use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::control::command::Command;
use crate::control::event_latch::EventLatch;
use crate::pipeline::frame_disposition::FrameReturnHook;
use crate::pipeline::frame_processor::FrameProcessor;
use crate::pipeline::position_report::PositionReport;
use crate::shared::frame::Frame;
use crate::shared::shutdown::ShutdownTrigger;

/// Externally owned guarding-mode switch. The pipeline only reads it, once
/// per frame.
#[derive(Clone, Debug, Default)]
pub struct GuardingMode(Arc<AtomicBool>);

impl GuardingMode {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}

/// Queues the pipeline is wired to at startup.
pub struct RecognitionChannels {
    pub frames: Receiver<Frame>,
    pub commands: Option<Receiver<Command>>,
    pub frame_sink: Option<Sender<Frame>>,
    pub results: Option<Sender<PositionReport>>,
    pub return_hook: Option<Box<dyn FrameReturnHook>>,
}

impl RecognitionChannels {
    pub fn new(frames: Receiver<Frame>) -> Self {
        Self {
            frames,
            commands: None,
            frame_sink: None,
            results: None,
            return_hook: None,
        }
    }

    pub fn with_commands(mut self, commands: Receiver<Command>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn with_frame_sink(mut self, sink: Sender<Frame>) -> Self {
        self.frame_sink = Some(sink);
        self
    }

    pub fn with_results(mut self, results: Sender<PositionReport>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_return_hook(mut self, hook: Box<dyn FrameReturnHook>) -> Self {
        self.return_hook = Some(hook);
        self
    }
}

/// Abstracts how the frame worker and command listener are run.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations.
pub trait RecognitionExecutor {
    fn start(
        &self,
        processor: FrameProcessor,
        channels: RecognitionChannels,
        guarding: GuardingMode,
    ) -> Result<RecognitionHandle, Box<dyn std::error::Error>>;
}

/// A running pipeline.
pub struct RecognitionHandle {
    latch: Arc<EventLatch>,
    trigger: ShutdownTrigger,
    frame_worker: JoinHandle<FrameProcessor>,
    command_listener: Option<JoinHandle<()>>,
}

impl RecognitionHandle {
    pub fn new(
        latch: Arc<EventLatch>,
        trigger: ShutdownTrigger,
        frame_worker: JoinHandle<FrameProcessor>,
        command_listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            latch,
            trigger,
            frame_worker,
            command_listener,
        }
    }

    /// The latch the command listener publishes into. Also usable directly
    /// by in-process controllers.
    pub fn latch(&self) -> &Arc<EventLatch> {
        &self.latch
    }

    /// Interrupts both workers, including any blocked send or receive, and
    /// joins them.
    pub fn shutdown(mut self) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
        self.trigger.fire();
        self.join()
    }

    /// Waits for the frame source to end, then stops the command listener.
    pub fn wait(self) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
        self.join()
    }

    fn join(self) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
        let Self {
            mut trigger,
            frame_worker,
            command_listener,
            ..
        } = self;

        let worker = frame_worker.join();
        trigger.fire();
        let listener_panicked = match command_listener {
            Some(handle) => handle.join().is_err(),
            None => false,
        };

        let processor = worker.map_err(|_| "Frame worker panicked")?;
        if listener_panicked {
            return Err("Command listener panicked".into());
        }
        processor.logger().summary();
        Ok(processor)
    }
}
