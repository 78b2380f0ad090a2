use crate::config::PipelineConfig;
use crate::pipeline::Pipeline;
use crate::printer::Printer;
use crate::producer::Producer;

/// Channel capacity used by test pipelines, small enough to exercise backpressure.
pub const TEST_CHANNEL_CAPACITY: usize = 2;

/// Creates a pipeline with a small channel capacity and the order check enabled.
pub fn create_pipeline<P, Q, W>(
    source: Option<P>,
    destination: Option<Q>,
    printer: W,
) -> Pipeline<P, Q, W>
where
    P: Producer,
    Q: Producer,
    W: Printer + Send + 'static,
{
    create_pipeline_with(source, destination, printer, true)
}

/// Creates a pipeline with a small channel capacity and the given order check setting.
pub fn create_pipeline_with<P, Q, W>(
    source: Option<P>,
    destination: Option<Q>,
    printer: W,
    check_order: bool,
) -> Pipeline<P, Q, W>
where
    P: Producer,
    Q: Producer,
    W: Printer + Send + 'static,
{
    let config = PipelineConfig {
        channel_capacity: TEST_CHANNEL_CAPACITY,
        check_order,
    };

    Pipeline::new(config, source, destination, printer)
}
