use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{Field, lookup_all, lookup_text};
use super::xml::XmlElement;

/// Alert-level fields shared by every feature of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AlertEnvelope {
    /// Read the envelope fields from the direct children of `alert`.
    pub fn from_element(alert: &XmlElement) -> Self {
        Self {
            identifier: lookup_text(alert, Field::Identifier),
            sender: lookup_text(alert, Field::Sender),
            sent: lookup_text(alert, Field::Sent),
            status: lookup_text(alert, Field::Status),
            msg_type: lookup_text(alert, Field::MsgType),
            scope: lookup_text(alert, Field::Scope),
        }
    }
}

/// One `info` block: event classification and timing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certainty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl InfoBlock {
    /// Read the fields of one `info` element.
    pub fn from_element(info: &XmlElement) -> Self {
        Self {
            category: lookup_text(info, Field::Category),
            event: lookup_text(info, Field::Event),
            urgency: lookup_text(info, Field::Urgency),
            severity: lookup_text(info, Field::Severity),
            certainty: lookup_text(info, Field::Certainty),
            effective: lookup_text(info, Field::Effective),
            onset: lookup_text(info, Field::Onset),
            expires: lookup_text(info, Field::Expires),
            headline: lookup_text(info, Field::Headline),
            description: lookup_text(info, Field::Description),
            instruction: lookup_text(info, Field::Instruction),
        }
    }
}

/// One `area` block with its raw polygon strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<String>,
    /// Raw "lat,lon lat,lon ..." strings, in document order
    #[serde(skip)]
    pub polygons: Vec<String>,
}

impl AreaBlock {
    /// Read one `area` element, keeping every polygon string in order.
    pub fn from_element(area: &XmlElement) -> Self {
        Self {
            area_desc: lookup_text(area, Field::AreaDesc),
            altitude: lookup_text(area, Field::Altitude),
            ceiling: lookup_text(area, Field::Ceiling),
            polygons: lookup_all(area, Field::Polygon)
                .into_iter()
                .map(|p| p.text.clone())
                .collect(),
        }
    }
}

/// Flat property bag for one alert/info/area combination.
pub fn merge_properties(
    alert: &AlertEnvelope,
    info: &InfoBlock,
    area: &AreaBlock,
) -> Map<String, Value> {
    let mut properties = Map::new();
    extend(&mut properties, alert);
    extend(&mut properties, info);
    extend(&mut properties, area);
    properties
}

fn extend<T: Serialize>(properties: &mut Map<String, Value>, part: &T) {
    // These structs only hold strings, so serialization cannot fail
    if let Ok(Value::Object(fields)) = serde_json::to_value(part) {
        properties.extend(fields);
    }
}
