//! YAML document -> `serde_json::Value` without silent loss.
//!
//! Deserializing straight into `serde_json::Value` lets a repeated key
//! overwrite the earlier one and turns `.nan`/`.inf` into `null`. This
//! conversion builds the same value but records the first such problem so
//! the loader can reject the document.
//!
//! Scalar mapping keys are coerced to strings: `1: one` becomes `"1"`,
//! `true: yes` becomes `"true"` and `~: x` becomes `"null"`. Sequence or
//! mapping keys cannot be represented and are reported.

use serde::Deserializer;
use serde::de::{DeserializeSeed, Error as _, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Deserialize one document. The outer error is a YAML syntax error; the
/// inner `Err` is a well-formed document whose content cannot be kept as is.
pub(crate) fn to_json<'de, D>(de: D) -> Result<Result<Value, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut issue = None;
    let value = ValueSeed { issue: &mut issue }.deserialize(de)?;
    Ok(match issue {
        Some(reason) => Err(reason),
        None => Ok(value),
    })
}

/// `deserialize_with` for a list of documents embedded in another YAML file.
pub(crate) fn documents<'de, D>(de: D) -> Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match to_json(de)? {
        Ok(Value::Null) => Ok(None),
        Ok(Value::Array(items)) => Ok(Some(items)),
        Ok(other) => Err(D::Error::custom(format!(
            "expected a list of documents, found {}",
            other
        ))),
        Err(reason) => Err(D::Error::custom(reason)),
    }
}

struct ValueSeed<'a> {
    issue: &'a mut Option<String>,
}

impl ValueSeed<'_> {
    fn child(&mut self) -> ValueSeed<'_> {
        ValueSeed {
            issue: &mut *self.issue,
        }
    }

    fn report(&mut self, reason: String) {
        self.issue.get_or_insert(reason);
    }
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, de: D) -> Result<Value, D::Error> {
        de.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ValueSeed<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E>(mut self, v: f64) -> Result<Value, E> {
        match Number::from_f64(v) {
            Some(n) => Ok(Value::Number(n)),
            None => {
                self.report(format!("non-finite number `{}` has no JSON form", v));
                Ok(Value::Null)
            }
        }
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Value, D::Error> {
        self.deserialize(de)
    }

    fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> Result<Value, A::Error> {
        let mut out = Vec::new();
        while let Some(item) = seq.next_element_seed(self.child())? {
            out.push(item);
        }
        Ok(Value::Array(out))
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> Result<Value, A::Error> {
        let mut out = Map::new();
        while let Some(key) = map.next_key_seed(self.child())? {
            let value = map.next_value_seed(self.child())?;
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => "null".to_string(),
                Value::Array(_) | Value::Object(_) => {
                    self.report("mapping key is not a scalar".to_string());
                    continue;
                }
            };
            if out.contains_key(&key) {
                self.report(format!("duplicate key `{}`", key));
                continue;
            }
            out.insert(key, value);
        }
        Ok(Value::Object(out))
    }

    fn visit_enum<A: serde::de::EnumAccess<'de>>(self, _data: A) -> Result<Value, A::Error> {
        Err(A::Error::custom("tagged YAML values are not supported"))
    }
}
