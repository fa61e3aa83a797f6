use serde::{Deserialize, Serialize};
use tally_core::{TransactionKind, OTHER_CATEGORY};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to parse category rules: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Rule for '{0}' has no keywords")]
    EmptyRule(String),
}

/// One keyword set mapped to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// `lowered` must already be lower-case.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Deterministic classification used when the model is unavailable.
///
/// Category rules are evaluated top to bottom and the first match wins, so
/// order in the list is the priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRules {
    pub rules: Vec<KeywordRule>,
    pub income_keywords: Vec<String>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(
                    "Food",
                    &["food", "restaurant", "coffee", "lunch", "dinner", "pizza", "burger"],
                ),
                KeywordRule::new("Transportation", &["gas", "fuel", "uber", "taxi", "bus", "train"]),
                KeywordRule::new("Entertainment", &["movie", "netflix", "spotify", "game"]),
                KeywordRule::new("Shopping", &["amazon", "watch", "phone", "clothes", "shopping"]),
                KeywordRule::new("Salary", &["salary", "paid", "income", "paycheck"]),
                KeywordRule::new(
                    "Healthcare",
                    &["doctor", "pharmacy", "medicine", "hospital", "dentist"],
                ),
                KeywordRule::new("Education", &["tuition", "course", "school", "textbook"]),
                KeywordRule::new(
                    "Utilities",
                    &["electricity", "electric bill", "water bill", "internet", "utility"],
                ),
                KeywordRule::new("Gift", &["gift", "present"]),
            ],
            income_keywords: ["salary", "paid", "income", "paycheck"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl KeywordRules {
    pub fn new(rules: Vec<KeywordRule>, income_keywords: Vec<String>) -> Result<Self, RulesError> {
        if let Some(empty) = rules.iter().find(|r| r.keywords.is_empty()) {
            return Err(RulesError::EmptyRule(empty.category.clone()));
        }
        let lower = |v: Vec<String>| -> Vec<String> { v.into_iter().map(|k| k.to_lowercase()).collect() };
        Ok(Self {
            rules: rules
                .into_iter()
                .map(|r| KeywordRule { category: r.category, keywords: lower(r.keywords) })
                .collect(),
            income_keywords: lower(income_keywords),
        })
    }

    /// ```toml
    /// income_keywords = ["salary", "refund"]
    ///
    /// [[rules]]
    /// category = "Food"
    /// keywords = ["coffee", "lunch"]
    /// ```
    pub fn from_toml(toml_content: &str) -> Result<Self, RulesError> {
        let parsed: KeywordRules = toml::from_str(toml_content)?;
        Self::new(parsed.rules, parsed.income_keywords)
    }

    pub fn category_for(&self, text: &str) -> &str {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lowered))
            .map(|r| r.category.as_str())
            .unwrap_or(OTHER_CATEGORY)
    }

    pub fn kind_for(&self, text: &str) -> TransactionKind {
        let lowered = text.to_lowercase();
        if self.income_keywords.iter().any(|k| lowered.contains(k.as_str())) {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }
}
