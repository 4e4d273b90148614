//! Change flushing
//!
//! Drains recorded changes into events. Attribute-level events fire for
//! every invocation; the coarse `Changed` broadcast only runs in the
//! outermost invocation, looping until listeners stop re-dirtying the model.

use std::collections::BTreeSet;

use super::Model;
use crate::events::ModelEvent;

impl Model {
    /// Flush silent changes accumulated so far
    pub fn change(&self) {
        self.flush(BTreeSet::new());
    }

    pub(crate) fn flush(&self, changes: BTreeSet<String>) {
        let nested = self.changing().replace(true);

        let promoted = self.with_store_mut(|s| s.promote_silent());
        let touched: BTreeSet<String> = changes.into_iter().chain(promoted).collect();
        for attr in touched {
            let value = self.get(&attr);
            self.publish(ModelEvent::AttributeChanged { attr, value });
        }

        if nested {
            return;
        }

        let mut iterations = 0usize;
        while self.with_store_mut(|s| s.begin_iteration()) {
            iterations += 1;
            self.publish(ModelEvent::Changed);
            self.with_store_mut(|s| s.settle_iteration());
        }
        self.changing().set(false);

        tracing::debug!(
            client_id = %self.client_id(),
            iterations,
            pending_len = self.with_store(|s| s.pending.len()),
            "flush settled"
        );
    }
}
