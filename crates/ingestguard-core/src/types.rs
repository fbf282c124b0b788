use std::collections::HashSet;

use crate::utils::hasher::Xxh3Builder;

pub type Batch = arrow::record_batch::RecordBatch;
pub type KeySet = HashSet<i64, Xxh3Builder>;
