use crate::Expectation;

/// How much diagnostic detail a validation run keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    /// Counts only
    #[default]
    Summary,
    /// Counts plus the natural keys of every offending row
    Complete,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub suite_name: String,
    /// Natural key column the offending rows are reported by
    pub key_column: String,
    pub total_rows: usize,
    pub format: ResultFormat,
    passed: bool,
    outcomes: Vec<ExpectationOutcome>,
}

impl ValidationResult {
    pub fn new(
        suite_name: String,
        key_column: String,
        total_rows: usize,
        format: ResultFormat,
    ) -> Self {
        Self {
            suite_name,
            key_column,
            total_rows,
            format,
            passed: true,
            outcomes: Vec::new(),
        }
    }

    pub fn add_outcome(&mut self, outcome: ExpectationOutcome) {
        self.passed &= outcome.success;
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ExpectationOutcome] {
        &self.outcomes
    }

    pub fn failed_outcomes(&self) -> impl Iterator<Item = &ExpectationOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Descriptions of every failed expectation, in declaration order.
    pub fn failed_expectations(&self) -> Vec<String> {
        self.failed_outcomes()
            .map(|o| o.expectation.to_string())
            .collect()
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn is_complete(&self) -> bool {
        self.format == ResultFormat::Complete
    }
}

#[derive(Debug, Clone)]
pub struct ExpectationOutcome {
    pub expectation: Expectation,
    pub success: bool,
    pub element_count: usize,
    pub unexpected_count: usize,
    pub unexpected_percent: f64,
    /// Set when the expectation could not be evaluated
    pub exception: Option<String>,
    /// Natural keys of the offending rows. Only filled in complete mode for
    /// row-scoped expectations whose rows could be attributed.
    pub unexpected_keys: Option<Vec<i64>>,
}

impl ExpectationOutcome {
    pub fn new(expectation: Expectation, element_count: usize, unexpected_count: usize) -> Self {
        let unexpected_percent = if element_count == 0 {
            0.0
        } else {
            unexpected_count as f64 / element_count as f64 * 100.0
        };
        Self {
            expectation,
            success: unexpected_count == 0,
            element_count,
            unexpected_count,
            unexpected_percent,
            exception: None,
            unexpected_keys: None,
        }
    }

    /// Outcome of an expectation that could not run, e.g. over a missing column.
    pub fn exception(expectation: Expectation, element_count: usize, message: String) -> Self {
        Self {
            expectation,
            success: false,
            element_count,
            unexpected_count: 0,
            unexpected_percent: 0.0,
            exception: Some(message),
            unexpected_keys: None,
        }
    }

    pub fn with_keys(mut self, keys: Vec<i64>) -> Self {
        self.unexpected_keys = Some(keys);
        self
    }
}
