pub mod frame_reader;
pub mod frame_writer;
