//! Field editing flow: debounced text commits and immediate toggles.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    debounce::{Commit, Debouncer},
    models::{NumericField, Settings},
    number::parse_number,
    store::{KeyValueStorage, SettingsStore},
    view::CalculatorView,
};

/// A text edit whose quiet period has elapsed.
pub type FieldCommit = Commit<NumericField, String>;

/// Owns the in-memory settings and routes every mutation through the store.
pub struct Editor<S> {
    store: SettingsStore<S>,
    settings: Settings,
    debouncer: Debouncer<NumericField, String>,
}

impl<S: KeyValueStorage> Editor<S> {
    /// Load settings from `store` and prepare a debouncer with `delay`.
    ///
    /// Returns the receiver on which expired text edits arrive; feed them to
    /// [`Editor::apply`].
    pub fn open(store: SettingsStore<S>, delay: Duration) -> (Self, mpsc::Receiver<FieldCommit>) {
        let settings = store.load();
        let (debouncer, commits) = Debouncer::new(delay);
        let editor = Self {
            store,
            settings,
            debouncer,
        };
        (editor, commits)
    }

    /// Current in-memory settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Backing store.
    pub fn store(&self) -> &SettingsStore<S> {
        &self.store
    }

    /// Rebuild the complete view from the current settings.
    pub fn view(&self) -> CalculatorView {
        CalculatorView::build(&self.settings)
    }

    /// Record a keystroke-level change; the value is committed once the
    /// field has been quiet for the debounce delay.
    pub fn input(&mut self, field: NumericField, raw: impl Into<String>) {
        self.debouncer.schedule(field, raw.into());
    }

    /// Whether `field` has an uncommitted edit.
    pub fn is_pending(&self, field: NumericField) -> bool {
        self.debouncer.is_pending(&field)
    }

    /// Commit a delivered edit. Returns `Ok(false)` when the edit was
    /// superseded and ignored.
    ///
    /// The in-memory value is updated even when persisting fails.
    pub fn apply(&mut self, commit: &FieldCommit) -> Result<bool> {
        if !self.debouncer.settle(commit) {
            debug!(field = commit.key.key(), "Discarding superseded edit");
            return Ok(false);
        }
        self.commit_text(commit.key, &commit.value)?;
        Ok(true)
    }

    /// Parse `raw` and commit it to `field` immediately.
    pub fn commit_text(&mut self, field: NumericField, raw: &str) -> Result<f64> {
        let value = parse_number(raw);
        self.settings.set(field, value);
        debug!(field = field.key(), raw, value, "Committing field");
        self.store.save(&self.settings)?;
        Ok(value)
    }

    /// Flip the debug flag; committed without debounce.
    pub fn set_debug(&mut self, enabled: bool) -> Result<()> {
        self.settings.debug_enabled = enabled;
        debug!(enabled, "Committing debug toggle");
        self.store.save(&self.settings)
    }

    /// Commit every pending edit right away, e.g. before shutdown.
    pub fn flush(&mut self) -> Result<usize> {
        let pending = self.debouncer.flush();
        let count = pending.len();
        for (field, raw) in pending {
            self.settings.set(field, parse_number(&raw));
        }
        if count > 0 {
            self.store.save(&self.settings)?;
        }
        Ok(count)
    }
}
