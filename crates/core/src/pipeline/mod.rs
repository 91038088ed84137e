pub mod frame_disposition;
pub mod frame_processor;
pub mod infrastructure;
pub mod overlay;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod position_report;
pub mod recognition_config;
