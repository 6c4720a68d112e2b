//! Shared progress tracking utilities.
//!
//! Extraction advances one table at a time; `TableProgress` counts described
//! tables and forwards each step to a caller-supplied callback, which the
//! command layer turns into an `indicatif` bar.

/// Callback receiving (tables done, tables total, table just described)
pub type ProgressFn = Box<dyn Fn(usize, usize, &str)>;

/// Counts described tables and reports each step.
pub struct TableProgress {
    callback: ProgressFn,
    total: usize,
    done: usize,
}

impl TableProgress {
    pub fn new(total: usize, callback: ProgressFn) -> Self {
        Self {
            callback,
            total,
            done: 0,
        }
    }

    /// Record that `table` has been described
    pub fn advance(&mut self, table: &str) {
        self.done += 1;
        (self.callback)(self.done, self.total, table);
    }

    pub fn done(&self) -> usize {
        self.done
    }
}
