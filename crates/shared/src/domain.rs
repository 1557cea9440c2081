use serde::{Deserialize, Serialize};

use crate::error::MalformedItem;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(OrgId);
id_newtype!(SpaceId);
id_newtype!(AppId);
id_newtype!(ItemId);

pub const FIELD_TITLE: &str = "title";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_TASKS: &str = "tasks";

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_DONE: &str = "Done";

/// Generic record in the remote item store. The field set is defined by the
/// item's app schema; the client only ever holds transient copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub external_id: String,
    #[serde(default)]
    pub values: Vec<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub settings: FieldSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    #[serde(default)]
    pub options: Vec<CategoryOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: FieldValueBody,
}

/// Read shape of a single field value. The server encodes the payload
/// differently per field type, so deserialization is by shape.
/// Reference must be tried before Category: a `{ item_id, .. }` object would
/// otherwise never be reached behind the looser category match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValueBody {
    Reference { item_id: ItemId },
    Category { id: i64, text: String },
    Text(String),
}

impl Item {
    pub fn field(&self, external_id: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.external_id == external_id)
    }

    fn require_field(&self, external_id: &str) -> Result<&Field, MalformedItem> {
        self.field(external_id).ok_or_else(|| MalformedItem::MissingField {
            item_id: self.item_id.0,
            external_id: external_id.to_string(),
        })
    }

    fn first_value<'a>(&self, field: &'a Field) -> Result<&'a FieldValueBody, MalformedItem> {
        field
            .values
            .first()
            .map(|value| &value.value)
            .ok_or_else(|| MalformedItem::EmptyField {
                item_id: self.item_id.0,
                external_id: field.external_id.clone(),
            })
    }

    /// Title text, required. Absent field, empty values, or a non-text
    /// shape all count as malformed.
    pub fn title(&self) -> Result<&str, MalformedItem> {
        let field = self.require_field(FIELD_TITLE)?;
        match self.first_value(field)? {
            FieldValueBody::Text(text) => Ok(text),
            other => Err(MalformedItem::WrongShape {
                item_id: self.item_id.0,
                external_id: FIELD_TITLE.to_string(),
                expected: "text",
                actual: other.shape_name(),
            }),
        }
    }

    /// Lenient title lookup used when filtering list rows: items with no
    /// usable title are skipped rather than reported.
    pub fn title_text(&self) -> Option<&str> {
        match self.field(FIELD_TITLE)?.values.first()?.value {
            FieldValueBody::Text(ref text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    /// Label of the currently set status option.
    pub fn status_label(&self) -> Result<&str, MalformedItem> {
        let field = self.require_field(FIELD_STATUS)?;
        match self.first_value(field)? {
            FieldValueBody::Category { text, .. } => Ok(text),
            other => Err(MalformedItem::WrongShape {
                item_id: self.item_id.0,
                external_id: FIELD_STATUS.to_string(),
                expected: "category",
                actual: other.shape_name(),
            }),
        }
    }

    pub fn status_is_done(&self) -> Result<bool, MalformedItem> {
        Ok(self.status_label()? == STATUS_DONE)
    }

    /// Resolves a status option id by label from this item's own field
    /// config, the way status writes pick their target option.
    pub fn status_option_id(&self, label: &str) -> Result<i64, MalformedItem> {
        let field = self.require_field(FIELD_STATUS)?;
        let options = field
            .config
            .as_ref()
            .map(|config| config.settings.options.as_slice())
            .filter(|options| !options.is_empty())
            .ok_or_else(|| MalformedItem::MissingOptions {
                item_id: self.item_id.0,
                external_id: FIELD_STATUS.to_string(),
            })?;
        options
            .iter()
            .find(|option| option.text == label)
            .map(|option| option.id)
            .ok_or_else(|| MalformedItem::UnknownOption {
                item_id: self.item_id.0,
                external_id: FIELD_STATUS.to_string(),
                label: label.to_string(),
            })
    }

    /// Ids referenced by the `tasks` field, in stored order. Absent field,
    /// empty values, and ill-shaped entries yield no ids; dangling targets
    /// are the caller's problem.
    pub fn task_refs(&self) -> Vec<ItemId> {
        let Some(field) = self.field(FIELD_TASKS) else {
            return Vec::new();
        };
        field
            .values
            .iter()
            .filter_map(|value| match value.value {
                FieldValueBody::Reference { item_id } => Some(item_id),
                _ => None,
            })
            .collect()
    }
}

impl FieldValueBody {
    fn shape_name(&self) -> &'static str {
        match self {
            FieldValueBody::Reference { .. } => "reference",
            FieldValueBody::Category { .. } => "category",
            FieldValueBody::Text(_) => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field(external_id: &str, text: &str) -> Field {
        Field {
            external_id: external_id.to_string(),
            values: vec![FieldValue {
                value: FieldValueBody::Text(text.to_string()),
            }],
            config: None,
        }
    }

    fn status_field(set: (i64, &str), options: &[(i64, &str)]) -> Field {
        Field {
            external_id: FIELD_STATUS.to_string(),
            values: vec![FieldValue {
                value: FieldValueBody::Category {
                    id: set.0,
                    text: set.1.to_string(),
                },
            }],
            config: Some(FieldConfig {
                settings: FieldSettings {
                    options: options
                        .iter()
                        .map(|(id, text)| CategoryOption {
                            id: *id,
                            text: text.to_string(),
                        })
                        .collect(),
                },
            }),
        }
    }

    #[test]
    fn deserializes_the_three_value_shapes() {
        let raw = r#"{
            "item_id": 17,
            "fields": [
                { "external_id": "title", "values": [ { "value": "Groceries" } ] },
                {
                    "external_id": "status",
                    "config": { "settings": { "options": [
                        { "id": 2, "text": "Pending" },
                        { "id": 3, "text": "Done" }
                    ] } },
                    "values": [ { "value": { "id": 2, "text": "Pending" } } ]
                },
                { "external_id": "tasks", "values": [ { "value": { "item_id": 23 } } ] }
            ]
        }"#;
        let item: Item = serde_json::from_str(raw).expect("item json");

        assert_eq!(item.item_id, ItemId(17));
        assert_eq!(item.title().expect("title"), "Groceries");
        assert_eq!(item.status_label().expect("status"), "Pending");
        assert_eq!(item.task_refs(), vec![ItemId(23)]);
    }

    #[test]
    fn reference_values_are_not_read_as_categories() {
        let raw = r#"{ "value": { "item_id": 9 } }"#;
        let value: FieldValue = serde_json::from_str(raw).expect("value json");
        assert_eq!(value.value, FieldValueBody::Reference { item_id: ItemId(9) });
    }

    #[test]
    fn title_reports_missing_and_empty_fields() {
        let missing = Item {
            item_id: ItemId(1),
            fields: Vec::new(),
        };
        assert!(matches!(
            missing.title(),
            Err(MalformedItem::MissingField { .. })
        ));

        let empty = Item {
            item_id: ItemId(2),
            fields: vec![Field {
                external_id: FIELD_TITLE.to_string(),
                values: Vec::new(),
                config: None,
            }],
        };
        assert!(matches!(empty.title(), Err(MalformedItem::EmptyField { .. })));
        assert_eq!(empty.title_text(), None);
    }

    #[test]
    fn status_option_id_resolves_by_label_from_config() {
        let task = Item {
            item_id: ItemId(5),
            fields: vec![
                text_field(FIELD_TITLE, "Milk"),
                status_field((2, STATUS_PENDING), &[(2, STATUS_PENDING), (3, STATUS_DONE)]),
            ],
        };

        assert_eq!(task.status_option_id(STATUS_DONE).expect("done id"), 3);
        assert!(!task.status_is_done().expect("pending"));
        assert!(matches!(
            task.status_option_id("Archived"),
            Err(MalformedItem::UnknownOption { .. })
        ));
    }

    #[test]
    fn status_without_options_config_is_malformed() {
        let mut field = status_field((2, STATUS_PENDING), &[]);
        field.config = None;
        let task = Item {
            item_id: ItemId(6),
            fields: vec![field],
        };
        assert!(matches!(
            task.status_option_id(STATUS_DONE),
            Err(MalformedItem::MissingOptions { .. })
        ));
    }

    #[test]
    fn task_refs_skip_ill_shaped_values() {
        let list = Item {
            item_id: ItemId(7),
            fields: vec![Field {
                external_id: FIELD_TASKS.to_string(),
                values: vec![
                    FieldValue {
                        value: FieldValueBody::Reference { item_id: ItemId(1) },
                    },
                    FieldValue {
                        value: FieldValueBody::Text("stray".to_string()),
                    },
                    FieldValue {
                        value: FieldValueBody::Reference { item_id: ItemId(2) },
                    },
                ],
                config: None,
            }],
        };
        assert_eq!(list.task_refs(), vec![ItemId(1), ItemId(2)]);
    }
}
