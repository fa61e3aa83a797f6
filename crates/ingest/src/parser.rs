use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::{NewTransaction, TransactionKind, CATEGORIES};

use crate::completion::{CompletionBackend, CompletionError};
use crate::rules::KeywordRules;

pub const MODEL_CONFIDENCE: f32 = 0.9;
pub const FALLBACK_CONFIDENCE: f32 = 0.6;
pub const DEFAULT_PARSE_TIMEOUT: Duration = Duration::from_secs(10);

fn re_amount() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(r"[$€£¥₹]?\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)")
            .expect("invalid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    Model,
    Fallback,
}

/// Best-effort reading of free text. `amount` is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub confidence: f32,
    pub source: ParseSource,
}

impl ParsedTransaction {
    /// Turn the parse into a ledger candidate, keeping the raw input as the
    /// original text.
    pub fn into_candidate(self, original_text: &str) -> NewTransaction {
        NewTransaction {
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            description: self.description,
            original_text: Some(original_text.to_string()),
            occurred_at: None,
        }
    }
}

pub struct TextParser<C: CompletionBackend> {
    backend: C,
    rules: KeywordRules,
    timeout: Duration,
}

impl<C: CompletionBackend> TextParser<C> {
    pub fn new(backend: C) -> Self {
        Self { backend, rules: KeywordRules::default(), timeout: DEFAULT_PARSE_TIMEOUT }
    }

    pub fn with_rules(mut self, rules: KeywordRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Never fails: any problem on the model path drops to the keyword fallback.
    pub async fn parse(&self, text: &str) -> ParsedTransaction {
        match self.parse_with_model(text).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "model parse failed, using keyword fallback");
                self.parse_fallback(text)
            }
        }
    }

    async fn parse_with_model(&self, text: &str) -> Result<ParsedTransaction, CompletionError> {
        let prompt = build_prompt(text);
        let reply = tokio::time::timeout(self.timeout, self.backend.complete(&prompt))
            .await
            .map_err(|_| CompletionError::Timeout(self.timeout))??;
        interpret_reply(&reply)
    }

    pub fn parse_fallback(&self, text: &str) -> ParsedTransaction {
        ParsedTransaction {
            amount: extract_amount(text),
            kind: self.rules.kind_for(text),
            category: self.rules.category_for(text).to_string(),
            description: text.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            source: ParseSource::Fallback,
        }
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        "Analyze this financial transaction text and extract:\n\
         - amount (number, always positive)\n\
         - type (either \"income\" or \"expense\")\n\
         - category (one of: {categories})\n\
         - description (brief description)\n\
         \n\
         Text: \"{text}\"\n\
         \n\
         Return only a JSON object: {{\"amount\": number, \"type\": string, \"category\": string, \"description\": string}}",
        categories = CATEGORIES.join(", "),
    )
}

/// First number in the text, optionally prefixed by a currency symbol; zero if none.
pub fn extract_amount(text: &str) -> Decimal {
    re_amount()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| Decimal::from_str(&m.as_str().replace(',', "")).ok())
        .unwrap_or(Decimal::ZERO)
}

fn interpret_reply(reply: &str) -> Result<ParsedTransaction, CompletionError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => return Err(CompletionError::Malformed("no JSON object in reply".into())),
    };

    let value: Value = serde_json::from_str(json)
        .map_err(|e| CompletionError::Malformed(format!("invalid JSON: {e}")))?;

    let amount = match value.get("amount") {
        Some(Value::Number(n)) => decimal_from_json(&n.to_string()),
        Some(Value::String(s)) => decimal_from_json(s.trim()),
        _ => None,
    }
    .ok_or_else(|| CompletionError::Malformed("missing or invalid amount".into()))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| TransactionKind::from_str(s).ok())
        .ok_or_else(|| CompletionError::Malformed("missing or invalid type".into()))?;

    let category = non_empty_field(&value, "category")?;
    let description = non_empty_field(&value, "description")?;

    Ok(ParsedTransaction {
        amount: amount.abs(),
        kind,
        category: canonical_category(category),
        description: description.to_string(),
        confidence: MODEL_CONFIDENCE,
        source: ParseSource::Model,
    })
}

fn decimal_from_json(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn non_empty_field<'a>(value: &'a Value, key: &str) -> Result<&'a str, CompletionError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CompletionError::Malformed(format!("missing or empty {key}")))
}

/// Use the recommended spelling when the model returns a known category in a
/// different case; keep anything else as given.
fn canonical_category(category: &str) -> String {
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(category))
        .map(|c| c.to_string())
        .unwrap_or_else(|| category.to_string())
}
