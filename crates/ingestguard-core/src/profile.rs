//! Histogram binning for customer profile distributions.

/// One right-closed bin, `(lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
    pub count: usize,
}

impl HistogramBin {
    pub fn mid(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Named bin layout used by the `profile` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinPreset {
    Age,
    Income,
}

impl BinPreset {
    pub fn edges(&self) -> Vec<f64> {
        let base = (0..=10).map(|i| f64::from(i) * 10.0);
        match self {
            BinPreset::Age => base.collect(),
            BinPreset::Income => base.map(|e| e * 1_000.0).collect(),
        }
    }

    pub fn label(&self, lower: f64, upper: f64) -> String {
        match self {
            BinPreset::Age => format!("{}-{} years", lower, upper),
            BinPreset::Income => {
                if lower == 0.0 {
                    "Less than $10k".to_string()
                } else if upper == 100_000.0 {
                    "$90k+".to_string()
                } else {
                    format!("${}k-{}k", lower / 1_000.0, upper / 1_000.0)
                }
            }
        }
    }

    pub fn histogram(&self, values: &[f64]) -> Vec<HistogramBin> {
        histogram(values, &self.edges(), |lo, hi| self.label(lo, hi))
    }
}

/// Count `values` into the bins delimited by consecutive `edges`. Values on
/// an edge belong to the bin below it; values outside every bin are ignored.
pub fn histogram(
    values: &[f64],
    edges: &[f64],
    label: impl Fn(f64, f64) -> String,
) -> Vec<HistogramBin> {
    let mut bins: Vec<HistogramBin> = edges
        .windows(2)
        .map(|w| HistogramBin {
            lower: w[0],
            upper: w[1],
            label: label(w[0], w[1]),
            count: 0,
        })
        .collect();

    for value in values.iter().filter(|v| !v.is_nan()) {
        if let Some(bin) = bins
            .iter_mut()
            .find(|b| *value > b.lower && *value <= b.upper)
        {
            bin.count += 1;
        }
    }
    bins
}
