use anyhow::Context;
use tracing::info;

use crate::action::Action;
use crate::store::{Clock, Store};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub unchanged: usize,
}

/// Dispatches `actions` in order, stopping at the first rejected action.
pub fn replay<C: Clock>(
    store: &mut Store<C>,
    actions: Vec<Action>,
    source: &str,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (index, action) in actions.into_iter().enumerate() {
        let kind = action.kind();
        let outcome = store
            .dispatch(action)
            .with_context(|| format!("{source}: action {} ({kind}) rejected", index + 1))?;
        if outcome.is_applied() {
            summary.applied += 1;
        } else {
            summary.unchanged += 1;
        }
    }
    info!(
        source,
        applied = summary.applied,
        unchanged = summary.unchanged,
        "replayed actions"
    );
    Ok(summary)
}
