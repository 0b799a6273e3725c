//! Dynamic shape detection via a tagged sum rather than duck-typed dict
//! walks: the detector returns a [`ValueShape`] variant or a typed error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    KvMap,
    LikesDislikes,
    RulesList,
    ScheduleWindows,
    BooleanFlags,
    AttentionSettings,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("value payload matches no known shape")]
    Unrecognized,
}

/// Detects the shape of a JSON payload per the fixed rule order: the first
/// matching rule wins, most specific dict markers before the generic
/// `kv_map` fallback.
pub fn detect_shape(value: &serde_json::Value) -> Result<ValueShape, ShapeError> {
    match value {
        serde_json::Value::Object(map) => {
            if map.contains_key("likes") || map.contains_key("dislikes") {
                return Ok(ValueShape::LikesDislikes);
            }
            if !map.is_empty() && map.values().all(|v| v.is_boolean()) {
                return Ok(ValueShape::BooleanFlags);
            }
            if map.contains_key("focus_mode") || map.contains_key("do_not_disturb") {
                return Ok(ValueShape::AttentionSettings);
            }
            if map.contains_key("windows") || map.contains_key("time_slots") {
                return Ok(ValueShape::ScheduleWindows);
            }
            Ok(ValueShape::KvMap)
        }
        serde_json::Value::Array(items) => {
            if !items.is_empty() && items.iter().all(|v| v.is_string()) {
                return Ok(ValueShape::RulesList);
            }
            if !items.is_empty()
                && items.iter().all(|v| {
                    v.as_object()
                        .map(|o| o.contains_key("start") || o.contains_key("end") || o.contains_key("day"))
                        .unwrap_or(false)
                })
            {
                return Ok(ValueShape::ScheduleWindows);
            }
            Err(ShapeError::Unrecognized)
        }
        _ => Err(ShapeError::Unrecognized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_likes_dislikes() {
        let v = json!({"likes": ["coffee"], "dislikes": ["milk"]});
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::LikesDislikes);
    }

    #[test]
    fn detects_boolean_flags() {
        let v = json!({"dark_mode": true, "notifications": false});
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::BooleanFlags);
    }

    #[test]
    fn detects_attention_settings() {
        let v = json!({"focus_mode": "deep_work"});
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::AttentionSettings);
    }

    #[test]
    fn detects_schedule_windows_dict() {
        let v = json!({"windows": [{"start": "09:00", "end": "17:00"}]});
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::ScheduleWindows);
    }

    #[test]
    fn detects_rules_list() {
        let v = json!(["no calls after 9pm", "no email on weekends"]);
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::RulesList);
    }

    #[test]
    fn detects_schedule_windows_list() {
        let v = json!([{"day": "mon", "start": "09:00", "end": "17:00"}]);
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::ScheduleWindows);
    }

    #[test]
    fn falls_back_to_kv_map() {
        let v = json!({"timezone": "UTC"});
        assert_eq!(detect_shape(&v).unwrap(), ValueShape::KvMap);
    }

    #[test]
    fn rejects_scalars() {
        assert_eq!(detect_shape(&json!(42)), Err(ShapeError::Unrecognized));
        assert_eq!(detect_shape(&json!([1, 2, 3])), Err(ShapeError::Unrecognized));
    }
}
