//! Board-file document model.
//! A board file is a JSON array whose first element holds `"board"`, an ordered
//! list of groups. Consumers scan groups top to bottom and the first name that
//! matches wins, so group order is significant.
//!
//! Only the parts the fix touches are typed. Everything else (other keys of the
//! first element such as `"regdb"`, trailing array elements, unknown group
//! keys) is carried through as raw JSON in its original order.

use serde_json::{Map, Value};

use crate::error::FixError;

pub const BOARD_KEY: &str = "board";
const NAMES_KEY: &str = "names";
const DATA_KEY: &str = "data";

/// One lookup record: names that resolve to a single calibration payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    pub names: Vec<String>,
    pub data: Option<String>,
    pub extra: Map<String, Value>,
    // Key order as read; empty for groups built here
    layout: Vec<String>,
}

impl Group {
    pub fn new(names: Vec<String>, data: impl Into<String>) -> Self {
        Group {
            names,
            data: Some(data.into()),
            extra: Map::new(),
            layout: Vec::new(),
        }
    }

    /// `data` for reports; groups without one show as `unknown`.
    pub fn data_label(&self) -> &str {
        self.data.as_deref().unwrap_or("unknown")
    }

    fn from_value(value: Value, path: &str) -> Result<Self, FixError> {
        let Value::Object(mut fields) = value else {
            return Err(FixError::structure(path, "group is not an object"));
        };
        let layout = fields.keys().cloned().collect();

        let names = match fields.remove(NAMES_KEY) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(name) => Ok(name),
                    other => Err(FixError::structure(
                        format!("{path}.{NAMES_KEY}[{i}]"),
                        format!("expected a string, found {}", kind(&other)),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(FixError::structure(
                    format!("{path}.{NAMES_KEY}"),
                    format!("expected an array, found {}", kind(&other)),
                ));
            }
        };

        let data = match fields.remove(DATA_KEY) {
            None => None,
            Some(Value::String(data)) => Some(data),
            Some(other) => {
                return Err(FixError::structure(
                    format!("{path}.{DATA_KEY}"),
                    format!("expected a string, found {}", kind(&other)),
                ));
            }
        };

        Ok(Group {
            names,
            data,
            extra: fields,
            layout,
        })
    }

    /// Writes keys in input order; keys the input lacked follow as
    /// `names`, `data`, then the rest.
    fn into_value(self) -> Value {
        let Group {
            names,
            data,
            mut extra,
            layout,
        } = self;
        let mut names = Some(Value::Array(names.into_iter().map(Value::String).collect()));
        let mut data = data.map(Value::String);

        let mut fields = Map::new();
        for key in layout {
            let value = match key.as_str() {
                NAMES_KEY => names.take(),
                DATA_KEY => data.take(),
                _ => extra.remove(&key),
            };
            if let Some(value) = value {
                fields.insert(key, value);
            }
        }
        if let Some(names) = names {
            fields.insert(NAMES_KEY.to_string(), names);
        }
        if let Some(data) = data {
            fields.insert(DATA_KEY.to_string(), data);
        }
        fields.extend(extra);
        Value::Object(fields)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardDocument {
    pub board: Vec<Group>,
    // First array element; its "board" slot is refilled on write so the key keeps its position
    head: Map<String, Value>,
    rest: Vec<Value>,
}

impl BoardDocument {
    /// Checks the board-file shape and splits out the groups.
    pub fn from_value(value: Value) -> Result<Self, FixError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(FixError::structure(
                    "$",
                    format!("expected an array, found {}", kind(&other)),
                ));
            }
        };
        let mut items = items.into_iter();
        let first = items
            .next()
            .ok_or_else(|| FixError::structure("$", "document array is empty"))?;
        let mut head = match first {
            Value::Object(head) => head,
            other => {
                return Err(FixError::structure(
                    "[0]",
                    format!("expected an object, found {}", kind(&other)),
                ));
            }
        };

        let groups = match head.get_mut(BOARD_KEY).map(Value::take) {
            None => {
                return Err(FixError::structure(
                    "[0]",
                    format!("missing \"{BOARD_KEY}\" key"),
                ));
            }
            Some(Value::Array(groups)) => groups,
            Some(other) => {
                return Err(FixError::structure(
                    format!("[0].{BOARD_KEY}"),
                    format!("expected an array, found {}", kind(&other)),
                ));
            }
        };

        let board = groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| Group::from_value(group, &format!("[0].{BOARD_KEY}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BoardDocument {
            board,
            head,
            rest: items.collect(),
        })
    }

    pub fn into_value(self) -> Value {
        let mut head = self.head;
        head.insert(
            BOARD_KEY.to_string(),
            Value::Array(self.board.into_iter().map(Group::into_value).collect()),
        );
        let mut items = Vec::with_capacity(1 + self.rest.len());
        items.push(Value::Object(head));
        items.extend(self.rest);
        Value::Array(items)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
