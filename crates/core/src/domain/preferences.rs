use serde::{Deserialize, Serialize};

/// Travel preferences derived from chat messages or saved by the assistant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Upper price bound in whole currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<i64>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.category.is_none() && self.budget.is_none()
    }

    /// Values present in `newer` replace the current ones; absent values are kept.
    pub fn merge(&mut self, newer: &Preferences) {
        if let Some(country) = &newer.country {
            self.country = Some(country.clone());
        }
        if let Some(category) = &newer.category {
            self.category = Some(category.clone());
        }
        if let Some(budget) = newer.budget {
            self.budget = Some(budget);
        }
    }

    pub fn merged(mut self, newer: &Preferences) -> Self {
        self.merge(newer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Preferences;

    #[test]
    fn merge_overrides_only_present_values() {
        let stored = Preferences {
            country: Some("Japan".to_owned()),
            category: Some("Cultural".to_owned()),
            budget: Some(5000),
        };
        let newer = Preferences { budget: Some(3000), ..Preferences::default() };

        let merged = stored.merged(&newer);

        assert_eq!(merged.country.as_deref(), Some("Japan"));
        assert_eq!(merged.category.as_deref(), Some("Cultural"));
        assert_eq!(merged.budget, Some(3000));
    }

    #[test]
    fn empty_preferences_serialize_to_empty_object() {
        let json = serde_json::to_string(&Preferences::default()).expect("serialize");
        assert_eq!(json, "{}");
    }
}
