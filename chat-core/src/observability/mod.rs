pub mod logging;
pub mod propagation;

pub use logging::{init_test_tracing, init_tracing};
pub use propagation::{
    correlation_headers, response_request_id, traceparent, OutgoingRequest, REQUEST_ID_HEADER,
    TRACEPARENT_HEADER, TRACESTATE_HEADER,
};
