use serde::{Deserialize, Serialize};

/// One option of a category table: a human-readable key and its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub text: String,
}

impl Choice {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Ordered option table. Declaration order is the enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceTable {
    pub name: String,
    pub entries: Vec<Choice>,
}

impl ChoiceTable {
    pub fn new(name: impl Into<String>, entries: Vec<Choice>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn from_pairs(name: &str, pairs: &[(&str, &str)]) -> Self {
        Self::new(
            name,
            pairs
                .iter()
                .map(|(key, text)| Choice::new(*key, *text))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Choice> {
        self.entries.iter().find(|choice| choice.key == key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).map(|choice| choice.text.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|choice| choice.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        let mut duplicates = Vec::new();
        for key in self.keys() {
            if !seen.insert(key) {
                duplicates.push(key);
            }
        }
        duplicates
    }
}

/// How a hair hue is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRendering {
    Solid,
    Gradient,
}

/// Hair hue with its solid descriptor and an optional gradient descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HairColor {
    pub key: String,
    pub solid: String,
    pub gradient: Option<String>,
}

impl HairColor {
    pub fn solid(key: &str, solid: &str) -> Self {
        Self {
            key: key.to_string(),
            solid: solid.to_string(),
            gradient: None,
        }
    }

    pub fn with_gradient(key: &str, solid: &str, gradient: &str) -> Self {
        Self {
            key: key.to_string(),
            solid: solid.to_string(),
            gradient: Some(gradient.to_string()),
        }
    }

    /// Descriptor for `rendering`; gradient falls back to solid when absent.
    pub fn render(&self, rendering: ColorRendering) -> &str {
        match rendering {
            ColorRendering::Solid => &self.solid,
            ColorRendering::Gradient => self.gradient.as_deref().unwrap_or(&self.solid),
        }
    }
}

/// Converts a static string slice into an owned pool.
pub fn pool(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_preserves_declaration_order() {
        let table = ChoiceTable::from_pairs("eye_color", &[("蓝色", "blue"), ("绿色", "green")]);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["蓝色", "绿色"]);
        assert_eq!(table.text("绿色"), Some("green"));
        assert!(table.get("红色").is_none());
    }

    #[test]
    fn reports_duplicate_keys() {
        let table = ChoiceTable::from_pairs("body", &[("纤细", "slender"), ("纤细", "slim")]);
        assert_eq!(table.duplicate_keys(), vec!["纤细"]);
    }

    #[test]
    fn gradient_falls_back_to_solid() {
        let plain = HairColor::solid("金色", "blonde");
        assert_eq!(plain.render(ColorRendering::Gradient), "blonde");

        let styled = HairColor::with_gradient("银色", "silver", "silver to white gradient");
        assert_eq!(styled.render(ColorRendering::Gradient), "silver to white gradient");
        assert_eq!(styled.render(ColorRendering::Solid), "silver");
    }
}
