use std::str::FromStr;

/// Global `label=value` pair attached to every exported metric
#[derive(Debug, Clone, PartialEq)]
pub struct LabelValue {
    pub label: String,
    pub value: String,
}

impl LabelValue {
    pub fn new(label: String, value: String) -> Self {
        Self { label, value }
    }
}

impl FromStr for LabelValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((label, value)) if !label.is_empty() && !value.is_empty() => {
                Ok(Self::new(label.to_string(), value.to_string()))
            }
            _ => Err(format!("LabelValue {s} is not a valid label=value")),
        }
    }
}
