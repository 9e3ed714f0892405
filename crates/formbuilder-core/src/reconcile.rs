//! Response reconciliation engine
//!
//! Responses are stored exactly as submitted, so two value shapes coexist:
//! the current structured `{"value": ..., "subResponses": {...}}` and the
//! legacy bare scalar/array. Reconciliation normalizes both into the
//! structured shape for display and gates the read path behind the form's
//! optional password.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FormsError, FormsResult};
use crate::model::{FormRecord, ResponseRecord};
use crate::password::PasswordHasher;
use crate::schema::{self, FieldConfig, FieldKind, SubQuestion};

/// One field's answer in display shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseValue {
    /// The answer itself; scalar or array depending on the field kind
    pub value: Value,
    /// Answers to conditional follow-up questions, keyed by question name
    #[serde(rename = "subResponses", default)]
    pub sub_responses: Map<String, Value>,
}

impl ResponseValue {
    /// Normalize a stored value of either shape into the structured shape.
    ///
    /// A mapping carrying a `value` key passes through; anything else is
    /// wrapped whole as the value with no sub-responses. Shape age alone
    /// never rejects a stored answer.
    pub fn normalize(raw: &Value) -> Self {
        match raw.as_object() {
            Some(map) if map.contains_key("value") => Self {
                value: map.get("value").cloned().unwrap_or(Value::Null),
                sub_responses: map
                    .get("subResponses")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            },
            _ => Self {
                value: raw.clone(),
                sub_responses: Map::new(),
            },
        }
    }
}

/// One field's configuration in display shape
///
/// Every kind exposes the same envelope (`type`, `options`, `required`,
/// `subQuestions`, with empty defaults) so clients render uniformly;
/// sliders additionally carry their steps and default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayField {
    /// Field kind tag
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Option values; empty for non-choice kinds
    #[serde(default)]
    pub options: Vec<String>,
    /// Whether an answer is mandatory
    #[serde(default)]
    pub required: bool,
    /// Conditional follow-ups keyed by option value
    #[serde(rename = "subQuestions", default)]
    pub sub_questions: IndexMap<String, Vec<SubQuestion>>,
    /// Slider positions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    /// Slider default position
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl From<&FieldConfig> for DisplayField {
    fn from(config: &FieldConfig) -> Self {
        let mut display = Self {
            kind: config.kind(),
            options: Vec::new(),
            required: config.required(),
            sub_questions: IndexMap::new(),
            steps: None,
            default_value: None,
        };
        match config {
            FieldConfig::Dropdown(choice) | FieldConfig::Multiselect(choice) => {
                display.options = choice.options.clone();
                display.sub_questions = choice.sub_questions.clone();
            }
            FieldConfig::Slider {
                steps,
                default_value,
                ..
            } => {
                display.steps = Some(steps.clone());
                display.default_value = Some(default_value.clone());
            }
            FieldConfig::Text { .. } | FieldConfig::Image { .. } => {}
        }
        display
    }
}

/// The password-gated view of a form and its responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResult {
    /// Form title
    pub title: String,
    /// Display-shape schema, insertion-ordered
    pub fields: IndexMap<String, DisplayField>,
    /// Normalized responses, ordered by creation time ascending
    pub responses: Vec<IndexMap<String, ResponseValue>>,
}

/// Submission-time gate: reject once the form's expiry has passed.
///
/// Evaluated once per submission, before anything is written. Payload
/// contents are deliberately not checked against the schema; stored data
/// predating schema edits must keep submitting cleanly.
pub fn validate_submission(form: &FormRecord, now: DateTime<Utc>) -> FormsResult<()> {
    match form.expiry {
        Some(expiry) if now > expiry => Err(FormsError::FormExpired),
        _ => Ok(()),
    }
}

/// The password-gated read path.
///
/// Three states: an open form (no stored hash) goes straight to
/// normalization; a locked form requires a password and verifies it in
/// constant time before normalizing. An empty password counts as absent.
pub fn reconcile_for_display(
    form: &FormRecord,
    provided_password: Option<&str>,
    responses: &[ResponseRecord],
    hasher: &PasswordHasher,
) -> FormsResult<ViewResult> {
    if let Some(hash) = &form.password_hash {
        let password = provided_password
            .filter(|p| !p.is_empty())
            .ok_or(FormsError::PasswordRequired)?;
        if !hasher.verify(password, hash)? {
            return Err(FormsError::InvalidPassword);
        }
    }

    let fields = schema::normalize_fields(&form.fields)?
        .iter()
        .map(|(name, config)| (name.clone(), DisplayField::from(config)))
        .collect();

    let responses = responses
        .iter()
        .map(|record| {
            record
                .response_data
                .as_object()
                .into_iter()
                .flatten()
                .map(|(name, value)| (name.clone(), ResponseValue::normalize(value)))
                .collect()
        })
        .collect();

    Ok(ViewResult {
        title: form.title.clone(),
        fields,
        responses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::HashingConfig;
    use serde_json::json;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn dropdown_form(password_hash: Option<String>) -> FormRecord {
        FormRecord::new(
            "T",
            json!({"color": {"type": "dropdown", "options": ["red", "blue"]}}),
            password_hash,
            None,
        )
    }

    #[test]
    fn test_legacy_and_structured_values_display_identically() {
        let legacy = ResponseValue::normalize(&json!("red"));
        let structured = ResponseValue::normalize(&json!({"value": "red"}));
        let full = ResponseValue::normalize(&json!({"value": "red", "subResponses": {}}));

        assert_eq!(legacy, structured);
        assert_eq!(structured, full);
        assert_eq!(legacy.value, json!("red"));
        assert!(legacy.sub_responses.is_empty());
    }

    #[test]
    fn test_sub_responses_pass_through() {
        let value = ResponseValue::normalize(&json!({
            "value": ["red"],
            "subResponses": {"shade": "dark"}
        }));
        assert_eq!(value.value, json!(["red"]));
        assert_eq!(value.sub_responses.get("shade"), Some(&json!("dark")));
    }

    #[test]
    fn test_mapping_without_value_key_is_wrapped_whole() {
        let raw = json!({"shade": "dark"});
        let value = ResponseValue::normalize(&raw);
        assert_eq!(value.value, raw);
        assert!(value.sub_responses.is_empty());
    }

    #[test]
    fn test_open_form_needs_no_password() {
        let form = dropdown_form(None);
        let view = reconcile_for_display(&form, None, &[], &fast_hasher()).unwrap();
        assert_eq!(view.title, "T");
        assert_eq!(view.fields["color"].options, vec!["red", "blue"]);
        assert!(view.fields["color"].sub_questions.is_empty());
    }

    #[test]
    fn test_locked_form_password_gate() {
        let hasher = fast_hasher();
        let form = dropdown_form(Some(hasher.hash("pw").unwrap()));

        let err = reconcile_for_display(&form, None, &[], &hasher).unwrap_err();
        assert!(matches!(err, FormsError::PasswordRequired));

        let err = reconcile_for_display(&form, Some(""), &[], &hasher).unwrap_err();
        assert!(matches!(err, FormsError::PasswordRequired));

        let err = reconcile_for_display(&form, Some("nope"), &[], &hasher).unwrap_err();
        assert!(matches!(err, FormsError::InvalidPassword));

        assert!(reconcile_for_display(&form, Some("pw"), &[], &hasher).is_ok());
    }

    #[test]
    fn test_responses_normalized_for_display() {
        let form = dropdown_form(None);
        let responses = vec![
            ResponseRecord::new(form.uuid, json!({"color": "red"})),
            ResponseRecord::new(form.uuid, json!({"color": {"value": "blue"}})),
        ];

        let view = reconcile_for_display(&form, None, &responses, &fast_hasher()).unwrap();
        assert_eq!(view.responses.len(), 2);
        assert_eq!(view.responses[0]["color"].value, json!("red"));
        assert_eq!(view.responses[1]["color"].value, json!("blue"));
        assert!(view.responses[0]["color"].sub_responses.is_empty());
    }

    #[test]
    fn test_slider_display_carries_steps() {
        let form = FormRecord::new(
            "T",
            json!({"mood": {"type": "slider", "steps": ["low", "high"], "defaultValue": "low"}}),
            None,
            None,
        );
        let view = reconcile_for_display(&form, None, &[], &fast_hasher()).unwrap();
        let field = &view.fields["mood"];
        assert_eq!(field.kind, FieldKind::Slider);
        assert_eq!(field.steps.as_deref(), Some(&["low".to_string(), "high".to_string()][..]));
        assert_eq!(field.default_value.as_deref(), Some("low"));
    }

    #[test]
    fn test_expiry_gate() {
        let mut form = dropdown_form(None);
        assert!(validate_submission(&form, Utc::now()).is_ok());

        form.expiry = Some(Utc::now() - chrono::Duration::hours(1));
        let err = validate_submission(&form, Utc::now()).unwrap_err();
        assert!(matches!(err, FormsError::FormExpired));

        form.expiry = Some(Utc::now() + chrono::Duration::hours(1));
        assert!(validate_submission(&form, Utc::now()).is_ok());
    }
}
