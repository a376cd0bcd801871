use serde::Serialize;

/// A single numeric input of a measurement schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Column / wire name, e.g. `koi_period`
    pub name: &'static str,
    /// Human readable label shown next to the input
    pub label: &'static str,
    /// Unit of measurement, empty when dimensionless
    pub unit: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, unit: &'static str) -> Self {
        Self { name, label, unit }
    }
}
