//! Rule kernels behind the expectations.
//!
//! Every rule returns an unexpected mask: a non-null `BooleanArray` with the
//! same length as its input, `true` for rows breaking the rule. Null values are
//! never unexpected, except for [`NullCheck`].

pub mod generic;
pub mod numeric;
pub mod string;

pub use generic::{NullCheck, TypeCheck, UnicityCheck};
pub use numeric::{PairCompare, Range};
pub use string::{IsInCheck, RegexMatch};

use arrow::array::BooleanArray;

/// Row indices flagged by a mask.
pub fn flagged_rows(mask: &BooleanArray) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, v)| (v == Some(true)).then_some(i))
        .collect()
}
