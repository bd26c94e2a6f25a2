//! Contact formatting
//!
//! Projects a raw person record into the flat contact shape used for
//! publishing. Every nested lookup is optional: a person without a last
//! communication or without collaborators still formats, with those fields
//! left empty.

use crate::types::{JsonValue, Record};
use serde::Serialize;
use uuid::Uuid;

/// Flattened contact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "FUBId")]
    pub fub_id: Option<JsonValue>,
    pub created: Option<String>,
    pub updated: Option<String>,
    #[serde(rename = "createdVia")]
    pub created_via: Option<String>,
    pub name: Option<String>,
    pub stage: Option<String>,
    #[serde(rename = "stageId")]
    pub stage_id: Option<JsonValue>,
    pub source: Option<String>,
    #[serde(rename = "sourceId")]
    pub source_id: Option<JsonValue>,
    #[serde(rename = "sourceUrl")]
    pub source_url: Option<String>,
    pub contacted: Option<JsonValue>,
    pub price: Option<JsonValue>,
    #[serde(rename = "assignedUserId")]
    pub assigned_user_id: Option<JsonValue>,
    #[serde(rename = "assignedPondId")]
    pub assigned_pond_id: Option<JsonValue>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<JsonValue>,
    #[serde(rename = "websiteVisits")]
    pub website_visits: Option<JsonValue>,
    pub claimed: Option<JsonValue>,
    #[serde(rename = "lastCommunicationid")]
    pub last_communication_id: Option<JsonValue>,
    #[serde(rename = "lastCommunicationType")]
    pub last_communication_type: Option<String>,
    #[serde(rename = "lastCommunicationDate")]
    pub last_communication_date: Option<String>,
    #[serde(rename = "lastCommunicationDirection")]
    pub last_communication_direction: Option<String>,
    #[serde(rename = "lastCommunicationContent")]
    pub last_communication_content: Option<String>,
    #[serde(rename = "AgentId")]
    pub agent_id: Option<JsonValue>,
    #[serde(rename = "AgentName")]
    pub agent_name: Option<String>,
    #[serde(rename = "AgentEmail")]
    pub agent_email: Option<String>,
    #[serde(rename = "AgentRole")]
    pub agent_role: Option<String>,
}

impl ContactRecord {
    /// Flatten a raw person record with a fresh random `Id`
    pub fn from_record(record: &Record) -> Self {
        Self::with_id(record, Uuid::new_v4().to_string())
    }

    /// Flatten a raw person record with the given `Id`
    pub fn with_id(record: &Record, id: String) -> Self {
        let last_comm = record.get("lastCommunication");
        let agent = first_collaborator(record);

        Self {
            id,
            fub_id: scalar(record.get("id")),
            created: text(record.get("created")),
            updated: text(record.get("updated")),
            created_via: text(record.get("createdVia")),
            name: text(record.get("name")),
            stage: text(record.get("stage")),
            stage_id: scalar(record.get("stageId")),
            source: text(record.get("source")),
            source_id: scalar(record.get("sourceId")),
            source_url: text(record.get("sourceUrl")),
            contacted: scalar(record.get("contacted")),
            price: scalar(record.get("price")),
            assigned_user_id: scalar(record.get("assignedUserId")),
            assigned_pond_id: scalar(record.get("assignedPondId")),
            assigned_to: text(record.get("assignedTo")),
            tags: strings(record.get("tags")),
            emails: values(record.get("emails")),
            phones: values(record.get("phones")),
            addresses: record
                .get("addresses")
                .and_then(JsonValue::as_array)
                .cloned()
                .unwrap_or_default(),
            website_visits: scalar(record.get("websiteVisits")),
            claimed: scalar(record.get("claimed")),
            last_communication_id: scalar(field(last_comm, "id")),
            last_communication_type: text(field(last_comm, "type")),
            last_communication_date: text(field(last_comm, "date")),
            last_communication_direction: text(field(last_comm, "direction")),
            last_communication_content: text(field(last_comm, "content")),
            agent_id: scalar(field(agent, "id")),
            agent_name: text(field(agent, "name")),
            agent_email: text(field(agent, "email")),
            agent_role: text(field(agent, "role")),
        }
    }
}

/// Look up a key in an optional nested object
fn field<'a>(parent: Option<&'a JsonValue>, key: &str) -> Option<&'a JsonValue> {
    parent.and_then(|p| p.as_object()).and_then(|obj| obj.get(key))
}

/// The collaborators field is a list; the first entry is the agent
fn first_collaborator(record: &Record) -> Option<&JsonValue> {
    match record.get("collaborators")? {
        JsonValue::Array(items) => items.first(),
        obj @ JsonValue::Object(_) => Some(obj),
        _ => None,
    }
}

fn scalar(value: Option<&JsonValue>) -> Option<JsonValue> {
    value.filter(|v| !v.is_null()).cloned()
}

fn text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

fn strings(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().filter_map(|v| text(Some(v))).collect())
        .unwrap_or_default()
}

/// Emails and phones are lists of `{value, type, ...}` objects
fn values(value: Option<&JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| text(field(Some(item), "value")))
            .collect(),
        Some(obj @ JsonValue::Object(_)) => text(field(Some(obj), "value")).into_iter().collect(),
        _ => Vec::new(),
    }
}
