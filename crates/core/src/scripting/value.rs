//! Marshalling of Lua values into host types.

use std::collections::BTreeMap;
use std::fmt;

use mlua::Value;
use serde::Serialize;
use thiserror::Error;

const MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("cannot marshal a Lua {0} value")]
    Unsupported(&'static str),

    #[error("cannot marshal a table with {0} keys")]
    MixedKeys(&'static str),

    #[error("table key is not valid UTF-8")]
    BinaryKey,

    #[error("table nesting deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    #[error("Lua error while marshalling: {0}")]
    Lua(#[from] mlua::Error),
}

/// A Lua value converted into host-native data.
///
/// Tables keyed exactly `1..=n` become lists (the empty table is the empty
/// list); tables keyed only by strings become maps. Integers and floats stay
/// distinct, so `3` and `3.0` do not compare equal. Strings that are not
/// valid UTF-8 keep their raw bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Nil,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<ScriptValue>),
    Map(BTreeMap<String, ScriptValue>),
}

impl ScriptValue {
    pub fn from_lua_value(value: Value) -> Result<Self, MarshalError> {
        convert(value, 0)
    }

    /// Convenience constructor for a list of strings.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptValue::List(items.into_iter().map(|s| ScriptValue::String(s.into())).collect())
    }

    pub fn as_list(&self) -> Option<&[ScriptValue]> {
        match self {
            ScriptValue::List(items) => Some(items),
            _ => None,
        }
    }
}

fn convert(value: Value, depth: usize) -> Result<ScriptValue, MarshalError> {
    match value {
        Value::Nil => Ok(ScriptValue::Nil),
        Value::Boolean(b) => Ok(ScriptValue::Bool(b)),
        Value::Integer(i) => Ok(ScriptValue::Integer(i)),
        Value::Number(n) => Ok(ScriptValue::Number(n)),
        Value::String(s) => Ok(match s.to_str() {
            Ok(text) => ScriptValue::String(text.to_string()),
            Err(_) => ScriptValue::Bytes(s.as_bytes().to_vec()),
        }),
        Value::Table(t) => {
            if depth >= MAX_DEPTH {
                return Err(MarshalError::TooDeep);
            }
            let mut ints: Vec<(i64, ScriptValue)> = Vec::new();
            let mut strs: BTreeMap<String, ScriptValue> = BTreeMap::new();
            for pair in t.pairs::<Value, Value>() {
                let (k, v) = pair?;
                match k {
                    Value::Integer(i) => ints.push((i, convert(v, depth + 1)?)),
                    Value::String(s) => {
                        let key = s.to_str().map_err(|_| MarshalError::BinaryKey)?.to_string();
                        strs.insert(key, convert(v, depth + 1)?);
                    }
                    other => return Err(MarshalError::MixedKeys(other.type_name())),
                }
            }
            match (ints.is_empty(), strs.is_empty()) {
                (true, false) => Ok(ScriptValue::Map(strs)),
                (false, false) => Err(MarshalError::MixedKeys("integer and string")),
                _ => {
                    ints.sort_by_key(|(i, _)| *i);
                    let is_sequence =
                        ints.iter().enumerate().all(|(pos, (i, _))| *i == pos as i64 + 1);
                    if !is_sequence {
                        return Err(MarshalError::MixedKeys("non-sequential integer"));
                    }
                    Ok(ScriptValue::List(ints.into_iter().map(|(_, v)| v).collect()))
                }
            }
        }
        other => Err(MarshalError::Unsupported(other.type_name())),
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => f.write_str("nil"),
            ScriptValue::Bool(b) => write!(f, "{b}"),
            ScriptValue::Integer(i) => write!(f, "{i}"),
            ScriptValue::Number(n) => write!(f, "{n:?}"),
            ScriptValue::String(s) => write!(f, "{s:?}"),
            ScriptValue::Bytes(bytes) => {
                f.write_str("\"")?;
                for &b in bytes {
                    if b.is_ascii_graphic() || b == b' ' {
                        if b == b'"' || b == b'\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\{b}")?;
                    }
                }
                f.write_str("\"")
            }
            ScriptValue::List(items) => {
                f.write_str("{ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(" }")
            }
            ScriptValue::Map(map) => {
                f.write_str("{ ")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                f.write_str(" }")
            }
        }
    }
}
