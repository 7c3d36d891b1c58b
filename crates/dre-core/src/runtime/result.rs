//! Execution results surfaced to the host

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{DreError, DreResult};

/// Command text that halts the run after it is surfaced
pub const STOP_COMMAND: &str = "stop";

const UNSELECTED: usize = usize::MAX;

/// One client-visible event of a run
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    Line { text: String },
    /// `choose` must be called exactly once before the next pull
    Options { options: Vec<String>, choose: OptionSelector },
    Command { text: String },
    NodeComplete { next_node: Option<String> },
}

impl ExecutionResult {
    pub fn is_node_complete(&self) -> bool {
        matches!(self, ExecutionResult::NodeComplete { .. })
    }
}

/// Selection callback handed out with an `Options` result
#[derive(Clone)]
pub struct OptionSelector {
    slot: Arc<AtomicUsize>,
    count: usize,
}

impl OptionSelector {
    pub(crate) fn new(count: usize) -> Self {
        OptionSelector {
            slot: Arc::new(AtomicUsize::new(UNSELECTED)),
            count,
        }
    }

    /// Number of options offered
    pub fn count(&self) -> usize {
        self.count
    }

    /// Pick the option at `index`. Fails for an out-of-range index or when
    /// a choice was already made.
    pub fn choose(&self, index: usize) -> DreResult<()> {
        if index >= self.count {
            return Err(DreError::InvalidOptionIndex {
                index,
                count: self.count,
            });
        }
        self.slot
            .compare_exchange(UNSELECTED, index, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| DreError::OptionAlreadySelected)
    }

    pub(crate) fn selection(&self) -> Option<usize> {
        match self.slot.load(Ordering::SeqCst) {
            UNSELECTED => None,
            index => Some(index),
        }
    }
}

impl fmt::Debug for OptionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSelector")
            .field("count", &self.count)
            .field("selection", &self.selection())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choose_once_in_range() {
        let selector = OptionSelector::new(3);
        assert!(matches!(
            selector.choose(3),
            Err(DreError::InvalidOptionIndex { index: 3, count: 3 })
        ));
        assert_eq!(selector.selection(), None);
        selector.choose(2).unwrap();
        assert_eq!(selector.selection(), Some(2));
        assert!(matches!(selector.clone().choose(0), Err(DreError::OptionAlreadySelected)));
    }
}
