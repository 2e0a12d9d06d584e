/*!
 * Monitoring
 * Structured tracing setup and operation spans
 */

mod tracer;

pub use tracer::{
    generate_trace_id, init_tracing, init_tracing_with, span_operation, OperationSpan,
    ENV_TRACE_JSON,
};
