use crossbeam_channel::Sender;

use crate::shared::frame::Frame;
use crate::shared::shutdown::ShutdownSignal;

/// Hands a finished frame back to whoever allocated it (e.g. a camera
/// driver's buffer pool).
pub trait FrameReturnHook: Send {
    fn return_frame(&mut self, frame: Frame);
}

/// Return hook that sends frames back over a channel, so the producer can
/// reuse or account for its buffers.
pub struct PoolFrameReturn {
    pool: Sender<Frame>,
}

impl PoolFrameReturn {
    pub fn new(pool: Sender<Frame>) -> Self {
        Self { pool }
    }
}

impl FrameReturnHook for PoolFrameReturn {
    fn return_frame(&mut self, frame: Frame) {
        if let Err(e) = self.pool.send(frame) {
            log::trace!("Frame pool closed, releasing frame {}", e.0.index());
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispositionKind {
    Forwarded,
    Returned,
    Released,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DisposeError {
    /// The frame sink's receiver is gone.
    SinkClosed,
    /// Shutdown fired while waiting for room in the frame sink.
    Interrupted,
}

/// The single release path every processed frame takes.
///
/// Chosen once at startup: forward when a frame sink exists, otherwise
/// return through the hook when returning is enabled, otherwise release.
/// `dispose` takes the frame by value so no frame can take two paths.
pub enum FrameDisposition {
    Forward(Sender<Frame>),
    Return(Box<dyn FrameReturnHook>),
    Release,
}

impl FrameDisposition {
    pub fn select(
        frame_sink: Option<Sender<Frame>>,
        return_hook: Option<Box<dyn FrameReturnHook>>,
        return_frames: bool,
    ) -> Self {
        match (frame_sink, return_hook) {
            (Some(sink), _) => FrameDisposition::Forward(sink),
            (None, Some(hook)) if return_frames => FrameDisposition::Return(hook),
            _ => FrameDisposition::Release,
        }
    }

    pub fn kind(&self) -> DispositionKind {
        match self {
            FrameDisposition::Forward(_) => DispositionKind::Forwarded,
            FrameDisposition::Return(_) => DispositionKind::Returned,
            FrameDisposition::Release => DispositionKind::Released,
        }
    }

    /// Blocks while the frame sink is full; shutdown interrupts the wait.
    pub fn dispose(
        &mut self,
        frame: Frame,
        shutdown: &ShutdownSignal,
    ) -> Result<DispositionKind, DisposeError> {
        match self {
            FrameDisposition::Forward(sink) => {
                let sink: &Sender<Frame> = sink;
                crossbeam_channel::select! {
                    send(sink, frame) -> res => match res {
                        Ok(()) => Ok(DispositionKind::Forwarded),
                        Err(_) => Err(DisposeError::SinkClosed),
                    },
                    recv(shutdown.receiver()) -> _ => Err(DisposeError::Interrupted),
                }
            }
            FrameDisposition::Return(hook) => {
                hook.return_frame(frame);
                Ok(DispositionKind::Returned)
            }
            FrameDisposition::Release => {
                drop(frame);
                Ok(DispositionKind::Released)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::shutdown::shutdown_channel;
    use std::sync::{Arc, Mutex};

    struct RecordingHook(Arc<Mutex<Vec<usize>>>);

    impl FrameReturnHook for RecordingHook {
        fn return_frame(&mut self, frame: Frame) {
            self.0.lock().unwrap().push(frame.index());
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::filled(4, 4, [1, 2, 3], index)
    }

    #[test]
    fn test_sink_takes_priority_over_hook() {
        let (tx, _rx) = crossbeam_channel::bounded(1);
        let returned = Arc::new(Mutex::new(Vec::new()));
        let disposition =
            FrameDisposition::select(Some(tx), Some(Box::new(RecordingHook(returned))), true);
        assert_eq!(disposition.kind(), DispositionKind::Forwarded);
    }

    #[test]
    fn test_hook_used_without_sink_when_enabled() {
        let returned = Arc::new(Mutex::new(Vec::new()));
        let disposition =
            FrameDisposition::select(None, Some(Box::new(RecordingHook(returned))), true);
        assert_eq!(disposition.kind(), DispositionKind::Returned);
    }

    #[test]
    fn test_release_when_returning_disabled() {
        let returned = Arc::new(Mutex::new(Vec::new()));
        let disposition =
            FrameDisposition::select(None, Some(Box::new(RecordingHook(returned))), false);
        assert_eq!(disposition.kind(), DispositionKind::Released);
        assert_eq!(
            FrameDisposition::select(None, None, true).kind(),
            DispositionKind::Released
        );
    }

    #[test]
    fn test_forward_delivers_frame() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let (_trigger, signal) = shutdown_channel();
        let mut disposition = FrameDisposition::select(Some(tx), None, true);

        assert_eq!(
            disposition.dispose(frame(3), &signal),
            Ok(DispositionKind::Forwarded)
        );
        assert_eq!(rx.try_recv().unwrap().index(), 3);
    }

    #[test]
    fn test_return_invokes_hook_once() {
        let returned = Arc::new(Mutex::new(Vec::new()));
        let (_trigger, signal) = shutdown_channel();
        let mut disposition =
            FrameDisposition::select(None, Some(Box::new(RecordingHook(returned.clone()))), true);

        disposition.dispose(frame(9), &signal).unwrap();

        assert_eq!(*returned.lock().unwrap(), vec![9]);
    }

    #[test]
    fn test_forward_to_closed_sink_fails() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);
        let (_trigger, signal) = shutdown_channel();
        let mut disposition = FrameDisposition::select(Some(tx), None, true);
        assert_eq!(
            disposition.dispose(frame(0), &signal),
            Err(DisposeError::SinkClosed)
        );
    }

    #[test]
    fn test_forward_to_full_sink_is_interrupted_by_shutdown() {
        let (tx, _rx) = crossbeam_channel::bounded(0);
        let (mut trigger, signal) = shutdown_channel();
        trigger.fire();
        let mut disposition = FrameDisposition::select(Some(tx), None, true);
        assert_eq!(
            disposition.dispose(frame(0), &signal),
            Err(DisposeError::Interrupted)
        );
    }

    #[test]
    fn test_pool_return_sends_back() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut hook = PoolFrameReturn::new(tx);
        hook.return_frame(frame(4));
        assert_eq!(rx.try_recv().unwrap().index(), 4);
    }
}
