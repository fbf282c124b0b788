use std::fmt;

/// Comparison applied between two columns of the same row, `lhs <op> rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOperator {
    Gt,
    Gte,
}

impl CompOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompOperator::Gt => ">",
            CompOperator::Gte => ">=",
        }
    }

    pub fn or_equal(or_equal: bool) -> Self {
        if or_equal {
            CompOperator::Gte
        } else {
            CompOperator::Gt
        }
    }
}

impl fmt::Display for CompOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
