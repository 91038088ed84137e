pub mod command;
pub mod command_listener;
pub mod event_latch;
