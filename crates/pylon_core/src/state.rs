use crate::report::PublishReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPhase {
    /// No pass has run yet.
    #[default]
    Idle,
    Scanning,
    Ready,
    Failed,
}

/// Snapshot of the last publishing pass.
///
/// A new value is built for every transition and swapped in whole, readers
/// never see a half updated state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishState {
    /// Incremented once per pass.
    pub generation: u64,
    pub phase: PassPhase,
    prefix: String,
    pub report: Option<PublishReport>,
    pub error: Option<String>,
}

impl PublishState {
    pub fn scanning(generation: u64) -> Self {
        Self {
            generation,
            phase: PassPhase::Scanning,
            ..Default::default()
        }
    }

    pub fn ready(generation: u64, prefix: String, report: PublishReport) -> Self {
        Self {
            generation,
            phase: PassPhase::Ready,
            prefix,
            report: Some(report),
            error: None,
        }
    }

    pub fn failed(generation: u64, error: String, report: Option<PublishReport>) -> Self {
        Self {
            generation,
            phase: PassPhase::Failed,
            prefix: String::new(),
            report,
            error: Some(error),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == PassPhase::Ready
    }

    /// The CDN prefix to advertise, empty unless the last pass succeeded.
    pub fn static_prefix(&self) -> &str {
        if self.is_ready() { &self.prefix } else { "" }
    }
}
