pub mod exposure_pipeline;
pub mod logger;
