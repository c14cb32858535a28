/// One step of an iterative solver.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord<S> {
    /// 1-based iteration number.
    pub index: usize,
    /// The solver-specific iterate(s) and function value(s) at this step.
    pub step: S,
    /// Convergence measure at this step: interval length, step norm, or
    /// successive-difference norm, depending on the solver.
    pub measure: f64,
}

/// Every step a solver took, in the order it took them.
/// Records can only be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace<S> {
    records: Vec<IterationRecord<S>>,
}

impl<S> Default for Trace<S> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<S> Trace<S> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append the next step, numbering it automatically.
    pub(crate) fn record(&mut self, step: S, measure: f64) {
        let index = self.records.len() + 1;
        self.records.push(IterationRecord {
            index,
            step,
            measure,
        });
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[IterationRecord<S>] {
        &self.records
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the solver finished without iterating.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent step.
    pub fn last(&self) -> Option<&IterationRecord<S>> {
        self.records.last()
    }

    /// Iterate over the records, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, IterationRecord<S>> {
        self.records.iter()
    }
}

impl<'t, S> IntoIterator for &'t Trace<S> {
    type Item = &'t IterationRecord<S>;
    type IntoIter = std::slice::Iter<'t, IterationRecord<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
