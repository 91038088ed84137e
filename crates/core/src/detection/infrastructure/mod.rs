pub mod scripted_face_detector;
pub mod two_stage_detector;
