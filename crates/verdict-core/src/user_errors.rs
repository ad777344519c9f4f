use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which partial failures are reported.
pub const USER_ERRORS_KEY: &str = "userErrors";

/// Path of the input field a [`UserError`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldPath {
    Name(String),
    Path(Vec<String>),
}

/// A validation failure reported inside an otherwise successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldPath>,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Any other keys of the record, kept as reported.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&Value> for UserError {
    fn from(value: &Value) -> Self {
        fn as_text(value: &Value) -> String {
            match value {
                Value::String(s) => s.clone(),
                value => value.to_string(),
            }
        }

        let Value::Object(fields) = value else {
            return Self {
                message: as_text(value),
                ..Self::default()
            };
        };

        let field = match fields.get("field") {
            Some(Value::String(name)) => Some(FieldPath::Name(name.clone())),
            Some(Value::Array(segments)) => Some(FieldPath::Path(segments.iter().map(as_text).collect())),
            _ => None,
        };

        let message = match fields.get("message") {
            None | Some(Value::Null) => String::new(),
            Some(message) => as_text(message),
        };

        let extra = fields
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "field" | "message" | "code"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            field,
            message,
            code: fields.get("code").and_then(Value::as_str).map(String::from),
            extra,
        }
    }
}

/// Breadth-first search for the shallowest non-empty `userErrors` array.
///
/// `null`, empty or non-array `userErrors` values do not stop the search.
pub fn locate_user_errors(value: &Value) -> Option<&Vec<Value>> {
    let mut queue = VecDeque::from([value]);

    while let Some(node) = queue.pop_front() {
        match node {
            Value::Array(items) => queue.extend(items),
            Value::Object(fields) => {
                for (key, field) in fields {
                    if let (USER_ERRORS_KEY, Value::Array(errors)) = (key.as_str(), field) {
                        if !errors.is_empty() {
                            return Some(errors);
                        }
                    }

                    queue.push_back(field);
                }
            },
            _ => (),
        }
    }

    None
}

/// Typed version of [`locate_user_errors`].
pub fn find_user_errors(value: &Value) -> Option<Vec<UserError>> {
    locate_user_errors(value).map(|errors| errors.iter().map(UserError::from).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn user_errors() -> Value {
        json!([{ "field": "foo", "message": "bar" }])
    }

    fn found(value: Value) -> Option<Value> {
        locate_user_errors(&value).cloned().map(Value::Array)
    }

    mod locate_user_errors {
        use super::*;

        #[test]
        fn should_return_none_if_data_is_not_an_object() {
            assert_eq!(found(json!({ "data": "" })), None);
            assert_eq!(found(json!({ "data": 5 })), None);
            assert_eq!(found(json!({ "data": user_errors() })), None);
            assert_eq!(found(json!({ "data": [5] })), None);
        }

        #[test]
        fn should_find_user_errors_at_the_top_level() {
            assert_eq!(found(json!({ "data": { "userErrors": user_errors() } })), Some(user_errors()));
        }

        #[test]
        fn should_ignore_empty_user_errors() {
            assert_eq!(found(json!({ "data": { "userErrors": [] } })), None);
            assert_eq!(found(json!({ "data": { "userErrors": null } })), None);
        }

        #[test]
        fn should_return_user_errors_if_the_input_contains_it() {
            assert_eq!(found(json!({ "userErrors": user_errors() })), Some(user_errors()));
        }

        #[test]
        fn should_find_user_errors_within_an_array() {
            assert_eq!(found(json!([{ "foo": "bar" }, { "userErrors": user_errors() }])), Some(user_errors()));
        }

        #[test]
        fn should_find_user_errors_in_a_nested_array() {
            assert_eq!(found(json!({ "data": { "foo": [{ "userErrors": user_errors() }] } })), Some(user_errors()));
        }

        #[test]
        fn should_find_user_errors_in_a_nested_object() {
            assert_eq!(found(json!({ "data": { "foo": { "bar": { "userErrors": user_errors() } } } })), Some(user_errors()));
        }

        #[test]
        fn should_find_user_errors_in_a_complex_object() {
            let value = json!({
                "bar": [{ "foo": "foo" }],
                "foo": { "baz": [{ "userErrors": user_errors() }] },
            });

            assert_eq!(found(value), Some(user_errors()));
        }

        #[test]
        fn should_continue_past_empty_user_errors() {
            let value = json!({
                "data": {
                    "userErrors": [],
                    "nested": { "userErrors": user_errors() },
                },
            });

            assert_eq!(found(value), Some(user_errors()));
        }

        #[test]
        fn should_prefer_the_shallowest_occurrence() {
            let value = json!({
                "a": { "b": { "userErrors": [{ "message": "deep" }] } },
                "c": { "userErrors": [{ "message": "shallow" }] },
            });

            assert_eq!(found(value), Some(json!([{ "message": "shallow" }])));
        }

        #[test]
        fn should_prefer_the_first_occurrence_at_equal_depth() {
            let value = json!({
                "first": { "userErrors": [{ "message": "first" }] },
                "second": { "userErrors": [{ "message": "second" }] },
            });

            assert_eq!(found(value), Some(json!([{ "message": "first" }])));
        }

        #[test]
        fn should_search_inside_non_array_user_errors() {
            let value = json!({ "userErrors": { "userErrors": user_errors() } });

            assert_eq!(found(value), Some(user_errors()));
        }

        #[test]
        fn should_return_none_without_user_errors_key() {
            let value = json!({
                "data": {
                    "products": { "edges": [{ "node": { "id": 1, "tags": ["a", "b"] } }] },
                    "errors": [{ "message": "not a user error" }],
                },
            });

            assert_eq!(found(value), None);
        }
    }

    mod find_user_errors {
        use super::*;

        #[test]
        fn should_work_for_real_world_scenarios() {
            let value = json!({
                "data": {
                    "discountAutomaticAppCreate": {
                        "automaticAppDiscount": null,
                        "userErrors": [
                            {
                                "field": ["automaticAppDiscount", "title"],
                                "message": "must be unique",
                            },
                        ],
                    },
                },
            });

            let errors = find_user_errors(&value).unwrap();

            assert_eq!(
                errors,
                vec![UserError {
                    field: Some(FieldPath::Path(vec!["automaticAppDiscount".to_string(), "title".to_string()])),
                    message: "must be unique".to_string(),
                    ..UserError::default()
                }]
            );
            assert_eq!(
                serde_json::to_value(&errors).unwrap(),
                json!([{ "field": ["automaticAppDiscount", "title"], "message": "must be unique" }])
            );
        }

        #[test]
        fn should_read_malformed_records_leniently() {
            let value = json!({ "userErrors": [{ "message": 42, "code": "TAKEN" }, "plain"] });

            let errors = find_user_errors(&value).unwrap();

            assert_eq!(errors[0].message, "42");
            assert_eq!(errors[0].code.as_deref(), Some("TAKEN"));
            assert_eq!(errors[0].field, None);
            assert_eq!(errors[1].message, "plain");
        }

        #[test]
        fn should_read_null_or_absent_message_as_empty() {
            let value = json!({ "userErrors": [{ "message": null, "field": "title" }, { "code": "BLANK" }] });

            let errors = find_user_errors(&value).unwrap();

            assert_eq!(errors[0].message, "");
            assert_eq!(errors[1].message, "");
        }

        #[test]
        fn should_keep_unknown_keys_of_the_record() {
            let record = json!({ "field": ["title"], "message": "is taken", "extraInfo": { "limit": 3 } });
            let value = json!({ "data": { "userErrors": [record.clone()] } });

            let errors = find_user_errors(&value).unwrap();

            assert_eq!(errors[0].extra.get("extraInfo"), Some(&json!({ "limit": 3 })));
            assert_eq!(serde_json::to_value(&errors).unwrap(), json!([record]));
        }

        #[test]
        fn should_return_none_when_nothing_is_found() {
            assert_eq!(find_user_errors(&json!({ "data": { "userErrors": [] } })), None);
        }
    }
}
