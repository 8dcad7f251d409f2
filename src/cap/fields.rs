//! Logical CAP fields and the tag names that may carry them.
//!
//! Every lookup goes through [`lookup`] and friends, which try the
//! candidates from [`Field::selectors`] in order. Absence is never an error.

use super::xml::XmlElement;

/// Logical CAP field, independent of how the document spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Alert,
    Info,
    Area,
    Polygon,
    Identifier,
    Sender,
    Sent,
    Status,
    MsgType,
    Scope,
    Category,
    Event,
    Urgency,
    Severity,
    Certainty,
    Effective,
    Onset,
    Expires,
    Headline,
    Description,
    Instruction,
    AreaDesc,
    Altitude,
    Ceiling,
}

/// Field to candidate tag names, prefixed form first.
const SELECTORS: &[(Field, &[&str])] = &[
    (Field::Alert, &["cap:alert", "alert"]),
    (Field::Info, &["cap:info", "info"]),
    (Field::Area, &["cap:area", "area"]),
    (Field::Polygon, &["cap:polygon", "polygon"]),
    (Field::Identifier, &["cap:identifier", "identifier"]),
    (Field::Sender, &["cap:sender", "sender"]),
    (Field::Sent, &["cap:sent", "sent"]),
    (Field::Status, &["cap:status", "status"]),
    (Field::MsgType, &["cap:msgType", "msgType"]),
    (Field::Scope, &["cap:scope", "scope"]),
    (Field::Category, &["cap:category", "category"]),
    (Field::Event, &["cap:event", "event"]),
    (Field::Urgency, &["cap:urgency", "urgency"]),
    (Field::Severity, &["cap:severity", "severity"]),
    (Field::Certainty, &["cap:certainty", "certainty"]),
    (Field::Effective, &["cap:effective", "effective"]),
    (Field::Onset, &["cap:onset", "onset"]),
    (Field::Expires, &["cap:expires", "expires"]),
    (Field::Headline, &["cap:headline", "headline"]),
    (Field::Description, &["cap:description", "description"]),
    (Field::Instruction, &["cap:instruction", "instruction"]),
    (Field::AreaDesc, &["cap:areaDesc", "areaDesc"]),
    (Field::Altitude, &["cap:altitude", "altitude"]),
    (Field::Ceiling, &["cap:ceiling", "ceiling"]),
];

impl Field {
    /// Candidate element names, most preferred first
    pub fn selectors(self) -> &'static [&'static str] {
        SELECTORS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }

    fn matches(self, element: &XmlElement) -> bool {
        self.selectors().contains(&element.name.as_str())
    }
}

/// First direct child carrying `field`; earlier selectors win.
pub fn lookup(element: &XmlElement, field: Field) -> Option<&XmlElement> {
    field
        .selectors()
        .iter()
        .find_map(|name| element.children.iter().find(|c| c.name == *name))
}

/// All direct children carrying `field`, in document order.
pub fn lookup_all(element: &XmlElement, field: Field) -> Vec<&XmlElement> {
    element
        .children
        .iter()
        .filter(|c| field.matches(c))
        .collect()
}

/// Trimmed text of the first child carrying `field`, if non-empty.
pub fn lookup_text(element: &XmlElement, field: Field) -> Option<String> {
    lookup(element, field)
        .map(|c| c.text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// `element` or its first descendant carrying `field`; earlier selectors win.
pub fn find(element: &XmlElement, field: Field) -> Option<&XmlElement> {
    let nodes = element.descendants();
    field
        .selectors()
        .iter()
        .find_map(|name| nodes.iter().copied().find(|n| n.name == *name))
}
