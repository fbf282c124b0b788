use std::collections::HashMap;

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray},
    compute::{self, and, is_not_null, is_null},
    datatypes::{DataType, Date32Type, Float64Type, Int32Type, Int64Type, ToByteSlice},
};
use arrow_array::{ArrowPrimitiveType, PrimitiveArray};
use xxhash_rust::xxh3::xxh3_64;

use crate::{IngestError, utils::hasher::Xxh3Builder};

pub struct NullCheck {}

impl NullCheck {
    pub fn new() -> Self {
        Self {}
    }

    pub fn validate(&self, array: &dyn Array) -> Result<BooleanArray, IngestError> {
        Ok(is_null(array)?)
    }
}

impl Default for NullCheck {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TypeCheck {
    expected: DataType,
}

impl TypeCheck {
    pub fn new(expected: DataType) -> Self {
        Self { expected }
    }

    /// A column already of the expected type passes. Text columns are cast
    /// value by value and a value the cast turns into null is unexpected. Any
    /// other source type has every non-null value flagged.
    pub fn validate(&self, array: &ArrayRef) -> Result<BooleanArray, IngestError> {
        if array.data_type() == &self.expected {
            return Ok(BooleanArray::from(vec![false; array.len()]));
        }
        match array.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 => {
                let casted = compute::cast(array, &self.expected)?;
                Ok(and(&is_not_null(array)?, &is_null(&casted)?)?)
            }
            _ => Ok(is_not_null(array)?),
        }
    }
}

#[derive(Clone)]
pub struct UnicityCheck {}

impl Default for UnicityCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl UnicityCheck {
    pub fn new() -> Self {
        Self {}
    }

    /// Flag every row whose value occurs more than once.
    pub fn validate(&self, array: &ArrayRef) -> Result<BooleanArray, IngestError> {
        let hashes = match array.data_type() {
            DataType::Int64 => hash_numeric(array.as_primitive::<Int64Type>()),
            DataType::Int32 => hash_numeric(array.as_primitive::<Int32Type>()),
            DataType::Float64 => hash_numeric(array.as_primitive::<Float64Type>()),
            DataType::Date32 => hash_numeric(array.as_primitive::<Date32Type>()),
            _ => {
                let text = compute::cast(array, &DataType::Utf8)?;
                text.as_string::<i32>()
                    .iter()
                    .map(|v| v.map(|s| xxh3_64(s.as_bytes())))
                    .collect()
            }
        };

        let mut counts: HashMap<u64, usize, Xxh3Builder> = HashMap::with_hasher(Xxh3Builder);
        hashes.iter().flatten().for_each(|h| {
            *counts.entry(*h).or_insert(0) += 1;
        });

        Ok(hashes
            .iter()
            .map(|h| Some(h.is_some_and(|h| counts.get(&h).copied().unwrap_or(0) > 1)))
            .collect())
    }
}

fn hash_numeric<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>) -> Vec<Option<u64>> {
    array
        .iter()
        .map(|v| v.map(|v| xxh3_64(v.to_byte_slice())))
        .collect()
}
