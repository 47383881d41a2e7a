//! Search statistics tracking.

/// Counters collected during one `choose_move` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchStats {
    /// Nodes entered (including transposition hits).
    pub nodes: u64,
    /// Transposition entries found at sufficient depth.
    pub tt_hits: u64,
    /// Probes that cut off without expanding.
    pub tt_cutoffs: u64,
    /// Alpha-beta cutoffs while iterating children.
    pub beta_cutoffs: u64,
    /// Deepest fully completed iteration.
    pub deepest_completed: u32,
}

impl SearchStats {
    /// Zero all counters, ready for the next search.
    pub fn reset(&mut self) {
        *self = SearchStats::default();
    }

    /// Log a one-line summary at debug level.
    pub fn log_summary(&self, table_size: usize) {
        tracing::debug!(
            nodes = self.nodes,
            tt_hits = self.tt_hits,
            tt_cutoffs = self.tt_cutoffs,
            beta_cutoffs = self.beta_cutoffs,
            depth = self.deepest_completed,
            table_size,
            "search finished"
        );
    }
}
