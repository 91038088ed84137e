pub mod enrollment_store;
pub mod face_recognizer;
pub mod identity_class;
