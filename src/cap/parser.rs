use crate::error::DocumentError;
use crate::feature::{Feature, Geometry};

use super::fields::{Field, find, lookup_all};
use super::model::{AlertEnvelope, AreaBlock, InfoBlock, merge_properties};
use super::polygon::parse_ring;
use super::xml::parse_tree;

/// Parse one CAP document into features, reporting why nothing came out.
///
/// Features are ordered by info element, then area element. A
/// well-formed alert without usable areas is `Ok` with no features.
///
/// # Errors
///
/// [`DocumentError::Markup`] or [`DocumentError::Unterminated`] for
/// malformed markup, [`DocumentError::MissingAlert`] when there is no
/// alert element.
pub fn try_parse_document(text: &str) -> Result<Vec<Feature>, DocumentError> {
    let root = parse_tree(text)?.ok_or(DocumentError::MissingAlert)?;
    let alert_element = find(&root, Field::Alert).ok_or(DocumentError::MissingAlert)?;
    let alert = AlertEnvelope::from_element(alert_element);

    let mut features = Vec::new();
    for info_element in lookup_all(alert_element, Field::Info) {
        let info = InfoBlock::from_element(info_element);

        for area_element in lookup_all(info_element, Field::Area) {
            let area = AreaBlock::from_element(area_element);
            if let Some(feature) = area_feature(&alert, &info, &area) {
                features.push(feature);
            }
        }
    }

    Ok(features)
}

/// Parse one CAP document, logging and discarding any failure.
pub fn parse_document(text: &str) -> Vec<Feature> {
    try_parse_document(text).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "discarding CAP document");
        Vec::new()
    })
}

fn area_feature(alert: &AlertEnvelope, info: &InfoBlock, area: &AreaBlock) -> Option<Feature> {
    let rings: Vec<_> = area.polygons.iter().filter_map(|p| parse_ring(p)).collect();
    let geometry = Geometry::from_rings(rings);

    // An area without geometry is still worth showing if it names a place
    if geometry.is_none() && area.area_desc.is_none() {
        tracing::debug!(
            identifier = alert.identifier.as_deref().unwrap_or_default(),
            "skipping area with neither polygons nor description"
        );
        return None;
    }

    Some(Feature {
        geometry,
        properties: merge_properties(alert, info, area),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(areas: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>IMD-2024-0612</identifier>
  <sender>alerts@imd.gov.in</sender>
  <sent>2024-06-12T10:00:00+05:30</sent>
  <status>Actual</status>
  <msgType>Alert</msgType>
  <scope>Public</scope>
  <info>
    <category>Met</category>
    <event>Heat Wave</event>
    <urgency>Immediate</urgency>
    <severity>Severe</severity>
    <certainty>Observed</certainty>
    <headline>Severe heat wave over Delhi</headline>
    {areas}
  </info>
</alert>"#
        )
    }

    #[test]
    fn test_single_polygon_feature() {
        let features = try_parse_document(&alert(
            "<area><areaDesc>New Delhi</areaDesc><polygon>28.6,77.1 28.7,77.1 28.7,77.3 28.6,77.1</polygon></area>",
        ))
        .unwrap();

        assert_eq!(features.len(), 1);
        let Some(Geometry::Polygon(rings)) = &features[0].geometry else {
            panic!("expected a polygon, got {:?}", features[0].geometry);
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0][0], [77.1, 28.6]);
        assert_eq!(features[0].property("identifier"), Some("IMD-2024-0612"));
        assert_eq!(features[0].property("event"), Some("Heat Wave"));
        assert_eq!(features[0].property("areaDesc"), Some("New Delhi"));
    }

    #[test]
    fn test_multiple_polygons_become_multipolygon() {
        let features = try_parse_document(&alert(
            "<area><areaDesc>Twin districts</areaDesc>
               <polygon>10,20 11,21 10,21 10,20</polygon>
               <polygon>0,0 1,0 1,1 0,0</polygon>
               <polygon>5,5 6,6 5,6</polygon>
             </area>",
        ))
        .unwrap();

        assert_eq!(features.len(), 1);
        let Some(Geometry::MultiPolygon(polygons)) = &features[0].geometry else {
            panic!("expected a multipolygon, got {:?}", features[0].geometry);
        };
        assert_eq!(polygons.len(), 3);
        assert!(polygons.iter().all(|p| p.len() == 1));
        assert_eq!(polygons[0][0][0], [20.0, 10.0]);
        assert_eq!(polygons[1][0][1], [0.0, 1.0]);
    }

    #[test]
    fn test_every_ring_closed() {
        let features = try_parse_document(&alert(
            "<area><polygon>1,1 2,2 3,1</polygon><polygon>4,4 5,5 6,4 4,4</polygon></area>
             <area><polygon>7,7 8,8 9,7</polygon></area>",
        ))
        .unwrap();

        assert_eq!(features.len(), 2);
        for feature in &features {
            for ring in feature.geometry.as_ref().unwrap().rings() {
                assert_eq!(ring.first(), ring.last());
            }
        }
    }

    #[test]
    fn test_short_ring_contributes_nothing() {
        let features = try_parse_document(&alert(
            "<area><polygon>1,1 2,2 x,y</polygon></area>",
        ))
        .unwrap();
        assert!(features.is_empty());

        // The surviving ring alone decides the geometry type
        let features = try_parse_document(&alert(
            "<area><polygon>1,1 2,2</polygon><polygon>0,0 1,0 1,1</polygon></area>",
        ))
        .unwrap();
        assert_eq!(features.len(), 1);
        assert!(matches!(features[0].geometry, Some(Geometry::Polygon(_))));
    }

    #[test]
    fn test_description_only_area_is_kept() {
        let features = try_parse_document(&alert(
            "<area><areaDesc>Whole of Kerala</areaDesc><polygon>bad data</polygon></area>",
        ))
        .unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].geometry, None);
        assert_eq!(features[0].property("areaDesc"), Some("Whole of Kerala"));
        assert_eq!(features[0].property("severity"), Some("Severe"));
    }

    #[test]
    fn test_prefixed_and_bare_markup_agree() {
        let bare = r#"<alert>
            <identifier>NWS-1</identifier><status>Actual</status>
            <info><event>Flood Warning</event>
              <area><areaDesc>Harris County</areaDesc><polygon>29.7,-95.4 29.8,-95.4 29.8,-95.3</polygon></area>
            </info>
        </alert>"#;
        let prefixed = r#"<cap:alert xmlns:cap="urn:oasis:names:tc:emergency:cap:1.2">
            <cap:identifier>NWS-1</cap:identifier><cap:status>Actual</cap:status>
            <cap:info><cap:event>Flood Warning</cap:event>
              <cap:area><cap:areaDesc>Harris County</cap:areaDesc><cap:polygon>29.7,-95.4 29.8,-95.4 29.8,-95.3</cap:polygon></cap:area>
            </cap:info>
        </cap:alert>"#;

        let expected = try_parse_document(bare).unwrap();
        assert_eq!(expected.len(), 1);
        assert_eq!(try_parse_document(prefixed).unwrap(), expected);
    }

    #[test]
    fn test_info_and_area_order() {
        let doc = r#"<cap:alert>
            <cap:identifier>X</cap:identifier>
            <info><event>First</event>
              <area><areaDesc>A1</areaDesc></area>
              <area><areaDesc>A2</areaDesc></area>
            </info>
            <cap:info><cap:event>Second</cap:event>
              <cap:area><cap:areaDesc>B1</cap:areaDesc></cap:area>
            </cap:info>
        </cap:alert>"#;

        let features = try_parse_document(doc).unwrap();
        let areas: Vec<_> = features.iter().filter_map(|f| f.property("areaDesc")).collect();
        assert_eq!(areas, ["A1", "A2", "B1"]);
        assert_eq!(features[2].property("event"), Some("Second"));
        assert!(features.iter().all(|f| f.property("identifier") == Some("X")));
    }

    #[test]
    fn test_malformed_documents_recover() {
        assert!(matches!(
            try_parse_document("<alert><info></alert>"),
            Err(DocumentError::Markup(_))
        ));
        assert!(matches!(
            try_parse_document("<feed><entry/></feed>"),
            Err(DocumentError::MissingAlert)
        ));
        assert!(parse_document("<alert><info>").is_empty());
        assert!(parse_document("not markup at all").is_empty());
    }

    #[test]
    fn test_alert_without_areas_is_empty() {
        assert!(try_parse_document(&alert("")).unwrap().is_empty());
        assert!(try_parse_document("<alert/>").unwrap().is_empty());
    }
}
