//! Editable view of the paper pattern returned by `/analyze`.
//!
//! The service owns the pattern schema; the client only understands the
//! section list it lets the user edit. Every field it does not know is kept in
//! `extra` and written back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub marks_per_question: u32,
    #[serde(default)]
    pub question_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    pub fn new(name: impl Into<String>, marks_per_question: u32, question_count: u32) -> Self {
        Self {
            name: name.into(),
            marks_per_question,
            question_count,
            extra: Map::new(),
        }
    }

    pub fn marks(&self) -> u32 {
        self.marks_per_question.saturating_mul(self.question_count)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperPattern {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaperPattern {
    pub fn from_value(value: &Value) -> ClientResult<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_value(&self) -> Value {
        // Serializing plain maps, strings and integers cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn total_marks(&self) -> u32 {
        self.sections.iter().map(Section::marks).sum()
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn remove_section(&mut self, index: usize) -> ClientResult<Section> {
        if index >= self.sections.len() {
            return Err(ClientError::NoSuchSection(index));
        }
        Ok(self.sections.remove(index))
    }

    /// Replace the editable fields of one row, keeping its unknown fields.
    pub fn update_section(
        &mut self,
        index: usize,
        name: &str,
        marks_per_question: u32,
        question_count: u32,
    ) -> ClientResult<()> {
        let section = self
            .sections
            .get_mut(index)
            .ok_or(ClientError::NoSuchSection(index))?;
        section.name = name.trim().to_owned();
        section.marks_per_question = marks_per_question;
        section.question_count = question_count;
        Ok(())
    }

    /// Apply one edited cell of a section row. `field` is the row column
    /// (`name`, `marks` or `count`); numeric columns reject anything that is
    /// not a non-negative integer and leave the row as it was.
    pub fn edit_row(&mut self, index: usize, field: &str, value: &str) -> ClientResult<()> {
        let current = self
            .sections
            .get(index)
            .ok_or(ClientError::NoSuchSection(index))?;
        let (name, marks, count) = match field {
            "name" => (value, current.marks_per_question, current.question_count),
            "marks" => (current.name.as_str(), parse_count(value)?, current.question_count),
            "count" => (current.name.as_str(), current.marks_per_question, parse_count(value)?),
            other => return Err(ClientError::Decode(format!("unknown row field `{other}`"))),
        };
        let name = name.to_owned();
        self.update_section(index, &name, marks, count)
    }
}

fn parse_count(value: &str) -> ClientResult<u32> {
    let value = value.trim();
    value
        .parse()
        .map_err(|_| ClientError::InvalidNumber(value.to_owned()))
}

/// RFC 7396: objects merge recursively, `null` deletes, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}
