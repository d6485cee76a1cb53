//! Lenient decoding of backend responses.
//!
//! Endpoints disagree on envelopes: lists come back bare or wrapped
//! (`{"tasks": [...]}`), and mutations answer with the record, a wrapped
//! record, or only an acknowledgement like `{"status": "success", "task_id": "..."}`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use crate::model::record::Record;

/// Keys an acknowledgement may use to report the id of a created record
const ACK_ID_KEYS: &[&str] = &["task_id", "template_id", "inserted_id", "_id", "id"];

/// Decode a list response, bare or wrapped under one of `keys`.
pub fn decode_list<T: DeserializeOwned>(value: Value, keys: &[&str]) -> ApiResult<Vec<T>> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(_) => value,
        Value::Object(mut map) => match keys.iter().find_map(|k| map.remove(*k)) {
            Some(Value::Null) => return Ok(Vec::new()),
            Some(inner) => inner,
            None => {
                return Err(ApiError::UnexpectedShape(format!(
                    "expected a list or an object with one of {:?}",
                    keys
                )));
            }
        },
        other => {
            return Err(ApiError::UnexpectedShape(format!(
                "expected a list, got {}",
                kind_of(&other)
            )));
        }
    };
    Ok(serde_json::from_value(items)?)
}

/// Decode the response to a create/update/duplicate call.
///
/// When the server only acknowledges, the submitted record is returned with
/// whatever id the acknowledgement carried.
pub fn decode_record<T: Record>(value: Value, keys: &[&str], submitted: &T) -> ApiResult<T> {
    let map = match value {
        Value::Object(map) => map,
        _ => return Ok(submitted.clone()),
    };

    for key in keys {
        if let Some(inner) = map.get(*key)
            && inner.is_object()
        {
            return Ok(serde_json::from_value(inner.clone())?);
        }
    }

    if map.contains_key("title") {
        return Ok(serde_json::from_value(Value::Object(map))?);
    }

    let mut record = submitted.clone();
    if let Some(id) = ACK_ID_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
    {
        record.set_id(Some(id.to_string()));
    }
    Ok(record)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskTemplate};
    use serde_json::json;

    #[test]
    fn list_bare_and_wrapped() {
        let bare: Vec<TaskTemplate> =
            decode_list(json!([{"_id": "t1", "title": "A"}]), &["templates"]).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<Task> = decode_list(
            json!({"tasks": [{"_id": "1", "title": "x"}, {"_id": "2", "title": "y"}]}),
            &["tasks"],
        )
        .unwrap();
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn list_null_is_empty_and_wrong_shape_errors() {
        let empty: Vec<Task> = decode_list(Value::Null, &["tasks"]).unwrap();
        assert!(empty.is_empty());

        let err = decode_list::<Task>(json!({"status": "ok"}), &["tasks"]).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape(_)));

        let err = decode_list::<Task>(json!("nope"), &["tasks"]).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn record_from_wrapper() {
        let submitted = TaskTemplate::new("draft");
        let rec = decode_record(
            json!({"status": "success", "template": {"_id": "t9", "title": "Saved"}}),
            &["template"],
            &submitted,
        )
        .unwrap();
        assert_eq!(rec.id.as_deref(), Some("t9"));
        assert_eq!(rec.title, "Saved");
    }

    #[test]
    fn record_from_bare_object() {
        let submitted = Task::new("draft");
        let rec = decode_record(json!({"_id": "5", "title": "Echo"}), &["task"], &submitted).unwrap();
        assert_eq!(rec.title, "Echo");
    }

    #[test]
    fn record_from_acknowledgement() {
        let submitted = Task::new("Upload raw footage");
        let rec = decode_record(
            json!({"status": "success", "task_id": "66a1"}),
            &["task"],
            &submitted,
        )
        .unwrap();
        assert_eq!(rec.id.as_deref(), Some("66a1"));
        assert_eq!(rec.title, "Upload raw footage");

        let rec = decode_record(Value::Null, &["task"], &submitted).unwrap();
        assert!(rec.id.is_none());
    }
}
