pub mod batch;
pub mod runner;
pub mod worker;

pub use batch::PipelineBatch;
pub use runner::{run_pipeline, PipelineError};
pub use worker::{DeliveryError, Worker};
