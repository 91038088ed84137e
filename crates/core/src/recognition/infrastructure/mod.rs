pub mod json_enrollment_store;
pub mod landmark_recognizer;
