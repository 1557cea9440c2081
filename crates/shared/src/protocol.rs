use std::collections::BTreeMap;

use serde::{
    ser::{SerializeSeq, Serializer},
    Deserialize, Serialize,
};

use crate::domain::{Item, ItemId, OrgId, SpaceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub org_id: OrgId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub space_id: SpaceId,
    pub name: String,
}

/// Create responses carry the full item; only the id matters to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedItem {
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    #[serde(default)]
    pub items: Vec<Item>,
}

/// One field in the simplified write format: text fields as a bare string,
/// category fields as a one-element array of option ids, reference fields as
/// an array of `{ "value": <item_id> }` objects. Reads come back in the
/// richer shape in `domain`; the two never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldWrite {
    Text(String),
    Category(i64),
    References(Vec<ItemId>),
}

impl Serialize for FieldWrite {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct ReferenceWrite {
            value: ItemId,
        }

        match self {
            FieldWrite::Text(text) => serializer.serialize_str(text),
            FieldWrite::Category(option_id) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(option_id)?;
                seq.end()
            }
            FieldWrite::References(ids) => {
                let mut seq = serializer.serialize_seq(Some(ids.len()))?;
                for id in ids {
                    seq.serialize_element(&ReferenceWrite { value: *id })?;
                }
                seq.end()
            }
        }
    }
}

/// The `fields` object of a create or update request. Keys are field
/// external ids; entries serialize in key order so payloads are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldsPayload(BTreeMap<String, FieldWrite>);

impl FieldsPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, external_id: &str, value: impl Into<String>) -> Self {
        self.0
            .insert(external_id.to_string(), FieldWrite::Text(value.into()));
        self
    }

    pub fn category(mut self, external_id: &str, option_id: i64) -> Self {
        self.0
            .insert(external_id.to_string(), FieldWrite::Category(option_id));
        self
    }

    pub fn references(mut self, external_id: &str, ids: Vec<ItemId>) -> Self {
        self.0
            .insert(external_id.to_string(), FieldWrite::References(ids));
        self
    }

    pub fn get(&self, external_id: &str) -> Option<&FieldWrite> {
        self.0.get(external_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldWrite)> {
        self.0.iter().map(|(key, write)| (key.as_str(), write))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_serialize_in_the_simplified_format() {
        let payload = FieldsPayload::new()
            .text("title", "Milk")
            .category("status", 2);
        let json = serde_json::to_value(&payload).expect("payload json");
        assert_eq!(json, serde_json::json!({ "status": [2], "title": "Milk" }));
    }

    #[test]
    fn reference_writes_keep_order() {
        let payload =
            FieldsPayload::new().references("tasks", vec![ItemId(4), ItemId(1), ItemId(9)]);
        let json = serde_json::to_value(&payload).expect("payload json");
        assert_eq!(
            json,
            serde_json::json!({
                "tasks": [ { "value": 4 }, { "value": 1 }, { "value": 9 } ]
            })
        );
    }

    #[test]
    fn filter_response_tolerates_missing_items() {
        let parsed: FilterResponse = serde_json::from_str("{}").expect("empty filter body");
        assert!(parsed.items.is_empty());
    }
}
