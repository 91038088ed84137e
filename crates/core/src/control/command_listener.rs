use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use super::command::Command;
use super::event_latch::EventLatch;
use crate::shared::shutdown::ShutdownSignal;

/// Spawns the worker that moves commands from the controller channel into
/// the latch.
///
/// Blocks only while waiting for the next command. Exits when the command
/// channel disconnects or shutdown fires.
pub fn spawn_command_listener(
    commands: Receiver<Command>,
    latch: Arc<EventLatch>,
    shutdown: ShutdownSignal,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("command-listener".into())
        .spawn(move || run_command_listener(&commands, &latch, &shutdown))
}

fn run_command_listener(commands: &Receiver<Command>, latch: &EventLatch, shutdown: &ShutdownSignal) {
    loop {
        crossbeam_channel::select! {
            recv(commands) -> msg => match msg {
                Ok(command) => {
                    log::debug!("Latched command: {command}");
                    latch.publish(command);
                }
                Err(_) => {
                    log::debug!("Command channel closed");
                    break;
                }
            },
            recv(shutdown.receiver()) -> _ => break,
        }
    }
}
