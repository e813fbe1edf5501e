use exam_core::model::SessionReport;

/// Receives the final report of every session that reaches `Ended`.
///
/// Called from the runtime loop exactly once per ended session, before the
/// ended snapshot is published. Implementations must not block.
pub trait ResultsSink: Send + Sync {
    fn deliver(&self, report: &SessionReport);
}

/// Sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardResults;

impl ResultsSink for DiscardResults {
    fn deliver(&self, _report: &SessionReport) {}
}
