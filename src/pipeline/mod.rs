// Batch pipeline module
// Completed-video analysis, the frame log exchange format, and decision tracing

pub mod batch;
pub mod frame_log;
pub mod trace;

pub use batch::{BatchAnalyzer, BatchReport};
pub use frame_log::{
    decode_frame_log, parse_frame_log, read_frame_log, render_frame_log, write_frame_log,
    FrameLogError,
};
pub use trace::{
    read_trace_file, report_entries, DecisionTrace, TraceEntry, TraceError, TraceRecord,
};
