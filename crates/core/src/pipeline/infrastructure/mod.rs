pub mod threaded_recognition_executor;
