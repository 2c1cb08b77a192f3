//! Gene values and genomes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single admissible value of a gene.
///
/// Numeric genes use `Int` or `Float`; categorical genes (activation
/// functions, optimiser names, ...) use `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl GeneValue {
    /// Numeric view of the value, `None` for categorical values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GeneValue::Int(v) => Some(*v as f64),
            GeneValue::Float(v) => Some(*v),
            GeneValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for GeneValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneValue::Int(v) => write!(f, "{v}"),
            GeneValue::Float(v) => write!(f, "{v}"),
            GeneValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for GeneValue {
    fn from(v: i64) -> Self {
        GeneValue::Int(v)
    }
}

impl From<i32> for GeneValue {
    fn from(v: i32) -> Self {
        GeneValue::Int(v.into())
    }
}

impl From<f64> for GeneValue {
    fn from(v: f64) -> Self {
        GeneValue::Float(v)
    }
}

impl From<&str> for GeneValue {
    fn from(v: &str) -> Self {
        GeneValue::Text(v.to_string())
    }
}

impl From<String> for GeneValue {
    fn from(v: String) -> Self {
        GeneValue::Text(v)
    }
}

/// Concrete assignment of a value to every gene of a gene space.
///
/// Genes are kept ordered by name so iteration (and therefore every random
/// draw made while walking a genome) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    genes: BTreeMap<String, GeneValue>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<GeneValue>) -> Self {
        self.genes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&GeneValue> {
        self.genes.get(name)
    }

    /// Numeric value of a gene, `None` if missing or categorical.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.genes.get(name).and_then(GeneValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeneValue)> {
        self.genes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, value: GeneValue) {
        self.genes.insert(name, value);
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut GeneValue> {
        self.genes.get_mut(name)
    }
}

impl<K, V> FromIterator<(K, V)> for Genome
where
    K: Into<String>,
    V: Into<GeneValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            genes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.genes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_value_untagged_serde() {
        let values: Vec<GeneValue> = serde_json::from_str(r#"[3, 0.5, "relu"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                GeneValue::Int(3),
                GeneValue::Float(0.5),
                GeneValue::Text("relu".to_string())
            ]
        );
    }

    #[test]
    fn test_genome_ordered_by_name() {
        let genome = Genome::new().with("y", 2).with("x", 1).with("act", "tanh");
        let names: Vec<_> = genome.names().collect();
        assert_eq!(names, vec!["act", "x", "y"]);
        assert_eq!(genome.get_f64("x"), Some(1.0));
        assert_eq!(genome.get_f64("act"), None);
        assert_eq!(genome.to_string(), r#"{act: "tanh", x: 1, y: 2}"#);
    }

    #[test]
    fn test_genome_json_is_plain_map() {
        let genome: Genome = [("x", 1i64), ("y", 7)].into_iter().collect();
        let json = serde_json::to_string(&genome).unwrap();
        assert_eq!(json, r#"{"x":1,"y":7}"#);
    }
}
