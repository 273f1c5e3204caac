// Debug module - diagnostics that stay out of the analysis hot path unless enabled

pub mod pipeline_tracer;

pub use pipeline_tracer::PipelineStage;
