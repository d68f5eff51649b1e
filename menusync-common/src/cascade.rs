// menusync-common/src/cascade.rs
use serde::{Deserialize, Serialize};

/// Progress events broadcast by the propagation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CascadeEvent {
    CascadeStarted {
        template: String,
        total_children: usize,
        workers: usize,
    },
    TemplateSynced {
        template: String,
        summary: String,
    },
    TemplateFailed {
        template: String,
        error: String,
    },
    ChildStarted {
        vm: String,
    },
    ChildSucceeded {
        vm: String,
        summary: String,
    },
    ChildFailed {
        vm: String,
        // Keep as String so events stay cheap to clone
        error: String,
    },
    CascadeFinished {
        template: String,
        duration_secs: f64,
        success_count: usize,
        fail_count: usize,
    },
}
