use std::sync::Arc;

/// Lifecycle of one remote resource.
///
/// `Loading` and `Failed` keep the last successfully loaded payload so views
/// can keep showing it while a refresh is pending or after it failed.
#[derive(Debug)]
pub enum FetchStatus<T> {
    Idle,
    Loading { previous: Option<Arc<T>> },
    Loaded(Arc<T>),
    Failed {
        reason: String,
        previous: Option<Arc<T>>,
    },
}

impl<T> Clone for FetchStatus<T> {
    fn clone(&self) -> Self {
        match self {
            FetchStatus::Idle => FetchStatus::Idle,
            FetchStatus::Loading { previous } => FetchStatus::Loading {
                previous: previous.clone(),
            },
            FetchStatus::Loaded(payload) => FetchStatus::Loaded(Arc::clone(payload)),
            FetchStatus::Failed { reason, previous } => FetchStatus::Failed {
                reason: reason.clone(),
                previous: previous.clone(),
            },
        }
    }
}

impl<T> Default for FetchStatus<T> {
    fn default() -> Self {
        FetchStatus::Idle
    }
}

impl<T> FetchStatus<T> {
    /// Last good payload, whatever the current state.
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            FetchStatus::Idle => None,
            FetchStatus::Loading { previous } | FetchStatus::Failed { previous, .. } => {
                previous.as_ref()
            }
            FetchStatus::Loaded(payload) => Some(payload),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchStatus::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchStatus::Idle => "idle",
            FetchStatus::Loading { .. } => "loading",
            FetchStatus::Loaded(_) => "loaded",
            FetchStatus::Failed { .. } => "failed",
        }
    }

    pub(crate) fn begin_loading(&mut self) {
        let previous = self.data().cloned();
        *self = FetchStatus::Loading { previous };
    }

    pub(crate) fn complete(&mut self, payload: T) {
        *self = FetchStatus::Loaded(Arc::new(payload));
    }

    /// Drops an in-flight load, falling back to the last good payload.
    pub(crate) fn cancel_loading(&mut self) -> bool {
        let FetchStatus::Loading { previous } = self else {
            return false;
        };
        *self = match previous.take() {
            Some(payload) => FetchStatus::Loaded(payload),
            None => FetchStatus::Idle,
        };
        true
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        let previous = self.data().cloned();
        *self = FetchStatus::Failed {
            reason: reason.into(),
            previous,
        };
    }
}

/// What became of one fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed { reason: String },
    /// A newer request was issued, or the owner was closed, before this one
    /// completed; its result was dropped.
    Superseded,
    /// The request was never sent.
    Skipped,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }
}
