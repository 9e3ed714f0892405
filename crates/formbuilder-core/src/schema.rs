//! Dynamic field-schema model
//!
//! A form's schema is an insertion-ordered mapping of field names to typed
//! configurations, stored as a JSON document. Several historical shapes
//! coexist in stored data: the current tagged-object form
//! (`{"type": "dropdown", "options": [...]}`), untyped objects, and the
//! oldest representation where a field's value was a bare array of option
//! strings. [`FieldConfig::normalize`] accepts all of them and produces the
//! canonical typed shape; normalization is idempotent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Field-configuration rule violations
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `type` value outside the known kinds
    #[error("field `{field}`: unsupported field type `{value}`")]
    UnsupportedType {
        /// Offending field name
        field: String,
        /// The rejected `type` value
        value: String,
    },

    /// Options-bearing field with no usable options
    #[error("field `{field}`: {kind} fields need at least one option")]
    EmptyOptions {
        /// Offending field name
        field: String,
        /// `dropdown` or `multiselect`
        kind: FieldKind,
    },

    /// Options entry that is not a string
    #[error("field `{field}`: options must be strings")]
    NonStringOption {
        /// Offending field name
        field: String,
    },

    /// The same option listed twice
    #[error("field `{field}`: duplicate option `{option}`")]
    DuplicateOption {
        /// Offending field name
        field: String,
        /// The repeated option value
        option: String,
    },

    /// Slider with no steps
    #[error("field `{field}`: slider fields need at least one step")]
    EmptySteps {
        /// Offending field name
        field: String,
    },

    /// Slider default outside its steps
    #[error("field `{field}`: defaultValue `{value}` is not one of the slider steps")]
    DefaultNotInSteps {
        /// Offending field name
        field: String,
        /// The rejected default
        value: String,
    },

    /// Sub-question without a name
    #[error("field `{field}`: sub-question under option `{option}` is missing a name")]
    UnnamedSubQuestion {
        /// Offending field name
        field: String,
        /// Option the sub-question hangs off
        option: String,
    },

    /// `fields` document that is not an object
    #[error("form fields must be a mapping of field name to configuration")]
    FieldsNotAMapping,
}

/// The known field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Image,
    Dropdown,
    Multiselect,
    Slider,
}

impl FieldKind {
    /// Parse a lower-cased type tag
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "dropdown" => Some(Self::Dropdown),
            "multiselect" => Some(Self::Multiselect),
            "slider" => Some(Self::Slider),
            _ => None,
        }
    }

    /// Canonical type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Dropdown => "dropdown",
            Self::Multiselect => "multiselect",
            Self::Slider => "slider",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follow-up question attached to one option of a choice field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    /// Question name, unique within its option
    pub name: String,
    /// Question kind; historically defaulted to `text`
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Options when the sub-question is itself a choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Shared payload of `dropdown` and `multiselect` fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceConfig {
    /// Whether an answer is mandatory
    #[serde(default)]
    pub required: bool,
    /// Ordered, distinct option values
    pub options: Vec<String>,
    /// Conditional follow-ups keyed by option value. Keys are not checked
    /// against `options`; stored forms rely on that leniency.
    #[serde(rename = "subQuestions", default)]
    pub sub_questions: IndexMap<String, Vec<SubQuestion>>,
}

/// One field's typed configuration
///
/// Serializes to the canonical stored shape: an object tagged by `type`
/// with camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldConfig {
    /// Free-form text answer
    Text {
        /// Whether an answer is mandatory
        #[serde(default)]
        required: bool,
    },
    /// Image upload answer
    Image {
        /// Whether an answer is mandatory
        #[serde(default)]
        required: bool,
    },
    /// Single choice from a fixed option list
    Dropdown(ChoiceConfig),
    /// Multiple choices from a fixed option list
    Multiselect(ChoiceConfig),
    /// Discrete slider over string-labelled positions
    Slider {
        /// Whether an answer is mandatory
        #[serde(default)]
        required: bool,
        /// Ordered slider positions
        steps: Vec<String>,
        /// Initial position; must be one of `steps`
        #[serde(rename = "defaultValue")]
        default_value: String,
    },
}

impl FieldConfig {
    /// The field's kind tag
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text { .. } => FieldKind::Text,
            Self::Image { .. } => FieldKind::Image,
            Self::Dropdown(_) => FieldKind::Dropdown,
            Self::Multiselect(_) => FieldKind::Multiselect,
            Self::Slider { .. } => FieldKind::Slider,
        }
    }

    /// Whether an answer is mandatory
    pub fn required(&self) -> bool {
        match self {
            Self::Text { required } | Self::Image { required } | Self::Slider { required, .. } => {
                *required
            }
            Self::Dropdown(choice) | Self::Multiselect(choice) => choice.required,
        }
    }

    /// Normalize one field's raw configuration into the canonical shape.
    ///
    /// Accepts every historical representation:
    /// - a non-object value (bare array or string) classifies as `text`
    ///   with `required = false`; legacy array contents are unusable and
    ///   are discarded
    /// - an object without a `type` key classifies as `text`
    /// - a tagged object goes through per-kind validation
    pub fn normalize(field: &str, raw: &Value) -> Result<Self, SchemaError> {
        let Some(map) = raw.as_object() else {
            return Ok(Self::Text { required: false });
        };

        let required = map
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let kind = match map.get("type") {
            None => FieldKind::Text,
            Some(tag) => {
                let tag = tag.as_str().unwrap_or_default();
                FieldKind::parse(tag).ok_or_else(|| SchemaError::UnsupportedType {
                    field: field.to_string(),
                    value: tag.to_string(),
                })?
            }
        };

        match kind {
            FieldKind::Text => Ok(Self::Text { required }),
            FieldKind::Image => Ok(Self::Image { required }),
            FieldKind::Dropdown | FieldKind::Multiselect => {
                let options = parse_options(field, kind, map.get("options"))?;
                let sub_questions = parse_sub_questions(field, map.get("subQuestions"))?;
                let choice = ChoiceConfig {
                    required,
                    options,
                    sub_questions,
                };
                Ok(match kind {
                    FieldKind::Dropdown => Self::Dropdown(choice),
                    _ => Self::Multiselect(choice),
                })
            }
            FieldKind::Slider => {
                let steps = parse_strings(field, map.get("steps"))?;
                if steps.is_empty() {
                    return Err(SchemaError::EmptySteps {
                        field: field.to_string(),
                    });
                }
                let default_value = map
                    .get("defaultValue")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                if !steps.contains(&default_value) {
                    return Err(SchemaError::DefaultNotInSteps {
                        field: field.to_string(),
                        value: default_value,
                    });
                }
                Ok(Self::Slider {
                    required,
                    steps,
                    default_value,
                })
            }
        }
    }

    /// Canonical JSON shape, as stored in the `fields` column
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Normalize a whole `fields` document, preserving insertion order
pub fn normalize_fields(raw: &Value) -> Result<IndexMap<String, FieldConfig>, SchemaError> {
    let map = raw.as_object().ok_or(SchemaError::FieldsNotAMapping)?;
    let mut fields = IndexMap::with_capacity(map.len());
    for (name, config) in map {
        fields.insert(name.clone(), FieldConfig::normalize(name, config)?);
    }
    Ok(fields)
}

/// Parse, trim, and de-blank an options array; reject empty or duplicated
fn parse_options(
    field: &str,
    kind: FieldKind,
    raw: Option<&Value>,
) -> Result<Vec<String>, SchemaError> {
    let options = parse_strings(field, raw)?;
    if options.is_empty() {
        return Err(SchemaError::EmptyOptions {
            field: field.to_string(),
            kind,
        });
    }
    let mut seen = std::collections::HashSet::new();
    for option in &options {
        if !seen.insert(option.as_str()) {
            return Err(SchemaError::DuplicateOption {
                field: field.to_string(),
                option: option.clone(),
            });
        }
    }
    Ok(options)
}

fn parse_strings(field: &str, raw: Option<&Value>) -> Result<Vec<String>, SchemaError> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let s = item.as_str().ok_or_else(|| SchemaError::NonStringOption {
            field: field.to_string(),
        })?;
        let s = s.trim();
        if !s.is_empty() {
            out.push(s.to_string());
        }
    }
    Ok(out)
}

fn parse_sub_questions(
    field: &str,
    raw: Option<&Value>,
) -> Result<IndexMap<String, Vec<SubQuestion>>, SchemaError> {
    let Some(map) = raw.and_then(Value::as_object) else {
        return Ok(IndexMap::new());
    };
    let mut sub_questions = IndexMap::with_capacity(map.len());
    for (option, entries) in map {
        let mut parsed = Vec::new();
        for entry in entries.as_array().into_iter().flatten() {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            if name.is_empty() {
                return Err(SchemaError::UnnamedSubQuestion {
                    field: field.to_string(),
                    option: option.clone(),
                });
            }
            let kind = match entry.get("type").and_then(Value::as_str) {
                None => FieldKind::Text,
                Some(tag) => {
                    FieldKind::parse(tag).ok_or_else(|| SchemaError::UnsupportedType {
                        field: format!("{field}.{name}"),
                        value: tag.to_string(),
                    })?
                }
            };
            let options = entry
                .get("options")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                });
            parsed.push(SubQuestion {
                name: name.to_string(),
                kind,
                options,
            });
        }
        sub_questions.insert(option.clone(), parsed);
    }
    Ok(sub_questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_array_becomes_text() {
        let config = FieldConfig::normalize("color", &json!(["red", "blue"])).unwrap();
        assert_eq!(config, FieldConfig::Text { required: false });
    }

    #[test]
    fn test_legacy_string_becomes_text() {
        let config = FieldConfig::normalize("note", &json!("whatever")).unwrap();
        assert_eq!(config, FieldConfig::Text { required: false });
    }

    #[test]
    fn test_mapping_without_type_is_text() {
        let config = FieldConfig::normalize("note", &json!({"required": true})).unwrap();
        assert_eq!(config, FieldConfig::Text { required: true });
    }

    #[test]
    fn test_dropdown_requires_options() {
        let err = FieldConfig::normalize("color", &json!({"type": "dropdown"})).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyOptions { .. }));

        let err =
            FieldConfig::normalize("color", &json!({"type": "multiselect", "options": []}))
                .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyOptions { .. }));
    }

    #[test]
    fn test_blank_options_are_dropped() {
        let err = FieldConfig::normalize(
            "color",
            &json!({"type": "dropdown", "options": ["  ", ""]}),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyOptions { .. }));

        let config = FieldConfig::normalize(
            "color",
            &json!({"type": "dropdown", "options": [" red ", "blue", ""]}),
        )
        .unwrap();
        match config {
            FieldConfig::Dropdown(choice) => assert_eq!(choice.options, vec!["red", "blue"]),
            other => panic!("expected dropdown, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_options_rejected() {
        let err = FieldConfig::normalize(
            "color",
            &json!({"type": "dropdown", "options": ["red", "red"]}),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateOption { .. }));
    }

    #[test]
    fn test_slider_default_must_be_a_step() {
        let err = FieldConfig::normalize(
            "mood",
            &json!({"type": "slider", "steps": ["low", "high"], "defaultValue": "mid"}),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DefaultNotInSteps { .. }));

        let config = FieldConfig::normalize(
            "mood",
            &json!({"type": "slider", "steps": ["low", "high"], "defaultValue": "low"}),
        )
        .unwrap();
        assert_eq!(config.kind(), FieldKind::Slider);
    }

    #[test]
    fn test_slider_needs_steps() {
        let err = FieldConfig::normalize(
            "mood",
            &json!({"type": "slider", "defaultValue": "low"}),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptySteps { .. }));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let err = FieldConfig::normalize("q", &json!({"type": "matrix"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { .. }));
    }

    #[test]
    fn test_sub_questions_parsed() {
        let config = FieldConfig::normalize(
            "color",
            &json!({
                "type": "multiselect",
                "options": ["red", "blue"],
                "subQuestions": {
                    "red": [{"name": "shade", "type": "dropdown", "options": ["dark", "light"]}]
                }
            }),
        )
        .unwrap();

        match config {
            FieldConfig::Multiselect(choice) => {
                let subs = &choice.sub_questions["red"];
                assert_eq!(subs.len(), 1);
                assert_eq!(subs[0].name, "shade");
                assert_eq!(subs[0].kind, FieldKind::Dropdown);
                assert_eq!(subs[0].options.as_deref(), Some(&["dark".to_string(), "light".to_string()][..]));
            }
            other => panic!("expected multiselect, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_question_name_required() {
        let err = FieldConfig::normalize(
            "color",
            &json!({
                "type": "dropdown",
                "options": ["red"],
                "subQuestions": {"red": [{"type": "text"}]}
            }),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnnamedSubQuestion { .. }));
    }

    #[test]
    fn test_sub_question_type_defaults_to_text() {
        let config = FieldConfig::normalize(
            "color",
            &json!({
                "type": "dropdown",
                "options": ["red"],
                "subQuestions": {"red": [{"name": "why"}]}
            }),
        )
        .unwrap();
        match config {
            FieldConfig::Dropdown(choice) => {
                assert_eq!(choice.sub_questions["red"][0].kind, FieldKind::Text);
            }
            other => panic!("expected dropdown, got {other:?}"),
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raws = [
            json!(["red", "blue"]),
            json!({"required": true}),
            json!({"type": "dropdown", "options": ["red", "blue"],
                   "subQuestions": {"red": [{"name": "shade"}]}}),
            json!({"type": "slider", "steps": ["1", "2", "3"], "defaultValue": "2"}),
            json!({"type": "image", "required": true}),
        ];
        for raw in raws {
            let once = FieldConfig::normalize("f", &raw).unwrap();
            let twice = FieldConfig::normalize("f", &once.to_value()).unwrap();
            assert_eq!(once, twice, "normalization drifted for {raw}");
        }
    }

    #[test]
    fn test_normalize_fields_preserves_order() {
        let fields = normalize_fields(&json!({
            "zeta": {"type": "text"},
            "alpha": {"type": "dropdown", "options": ["x"]},
            "mid": ["legacy"]
        }))
        .unwrap();

        let names: Vec<_> = fields.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(fields["mid"], FieldConfig::Text { required: false });
    }

    #[test]
    fn test_normalize_fields_rejects_non_mapping() {
        let err = normalize_fields(&json!(["not", "a", "map"])).unwrap_err();
        assert!(matches!(err, SchemaError::FieldsNotAMapping));
    }
}
