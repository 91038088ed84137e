pub mod cpu_frame_annotator;
