use arrow::array::{Array, ArrayRef, BooleanArray};
use arrow::compute;
use arrow::datatypes::DataType;
use arrow_array::{ArrowNumericType, PrimitiveArray};
use arrow_ord::cmp::{gt, gt_eq};
use num_traits::Num;
use std::fmt::Debug;

use crate::{IngestError, utils::operator::CompOperator};

/// Inclusive bounds check. Nulls are never out of range.
pub struct Range<N: Num + PartialOrd + Copy + Debug> {
    min: Option<N>,
    max: Option<N>,
}

impl<N> Range<N>
where
    N: Num + PartialOrd + Copy + Debug,
{
    pub fn new(min: Option<N>, max: Option<N>) -> Self {
        Self { min, max }
    }

    pub fn validate<T>(&self, array: &PrimitiveArray<T>) -> BooleanArray
    where
        T: ArrowNumericType<Native = N>,
    {
        array
            .iter()
            .map(|value| {
                Some(value.is_some_and(|v| {
                    self.min.is_some_and(|min| v < min) || self.max.is_some_and(|max| v > max)
                }))
            })
            .collect()
    }
}

/// Row-wise comparison of two columns, `lhs <op> rhs` must hold.
pub struct PairCompare {
    operator: CompOperator,
}

impl PairCompare {
    pub fn new(operator: CompOperator) -> Self {
        Self { operator }
    }

    /// Rows where both sides are null pass. Rows where exactly one side is
    /// null cannot satisfy the comparison and are unexpected.
    pub fn validate(&self, lhs: &ArrayRef, rhs: &ArrayRef) -> Result<BooleanArray, IngestError> {
        let (lhs, rhs) = align_types(lhs, rhs)?;
        let holds = match self.operator {
            CompOperator::Gt => gt(&lhs, &rhs),
            CompOperator::Gte => gt_eq(&lhs, &rhs),
        }?;

        Ok((0..holds.len())
            .map(|i| {
                Some(match (lhs.is_null(i), rhs.is_null(i)) {
                    (false, false) => !holds.value(i),
                    (true, true) => false,
                    _ => true,
                })
            })
            .collect())
    }
}

/// Comparison kernels need both sides of the same type; mixed numeric
/// columns are compared as floats.
fn align_types(lhs: &ArrayRef, rhs: &ArrayRef) -> Result<(ArrayRef, ArrayRef), IngestError> {
    if lhs.data_type() == rhs.data_type() {
        return Ok((lhs.clone(), rhs.clone()));
    }
    if lhs.data_type().is_numeric() && rhs.data_type().is_numeric() {
        return Ok((
            compute::cast(lhs, &DataType::Float64)?,
            compute::cast(rhs, &DataType::Float64)?,
        ));
    }
    Err(IngestError::InvalidExpectation(format!(
        "cannot compare {} with {}",
        lhs.data_type(),
        rhs.data_type()
    )))
}
