use serde::{Deserialize, Serialize};

/// A named raw string value as returned by a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    pub value: Option<String>,
}

/// One untyped row of a vendor response: dimension fields followed by metric
/// fields, both in vendor-reported order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub dimensions: Vec<RawField>,
    pub metrics: Vec<RawField>,
}

impl RawRecord {
    /// Pairs positional values with their header names. Extra values are
    /// dropped; missing values are recorded as `None`.
    pub fn from_values(
        dimension_headers: &[String],
        dimension_values: &[String],
        metric_headers: &[String],
        metric_values: &[String],
    ) -> Self {
        Self {
            dimensions: pair(dimension_headers, dimension_values),
            metrics: pair(metric_headers, metric_values),
        }
    }

    /// Looks a field up by name, dimensions first.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .chain(&self.metrics)
            .find(|field| field.name == name)
            .and_then(|field| field.value.as_deref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions
            .iter()
            .chain(&self.metrics)
            .map(|field| field.name.as_str())
    }
}

fn pair(headers: &[String], values: &[String]) -> Vec<RawField> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| RawField {
            name: name.clone(),
            value: values.get(idx).cloned(),
        })
        .collect()
}
