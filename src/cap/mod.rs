//! CAP (Common Alerting Protocol) document parsing.
//!
//! Only the alert/info/area fields needed for map rendering are modeled.
//! Markup lookups accept both `cap:`-prefixed and bare element names.

mod fields;
mod model;
mod parser;
mod polygon;
mod xml;

pub use fields::Field;
pub use model::{AlertEnvelope, AreaBlock, InfoBlock, merge_properties};
pub use parser::{parse_document, try_parse_document};
pub use polygon::{MIN_RING_POSITIONS, parse_pair, parse_ring};
pub use xml::{XmlElement, parse_tree};
