#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;

use async_trait::async_trait;
use capzip::{MemoryReader, ReadAt};
use tokio::sync::Notify;
use zip::write::SimpleFileOptions;

/// Build a ZIP archive from (name, contents) pairs; names ending in `/`
/// become directory entries.
pub fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// A `cap:`-prefixed alert with one info and one area holding `polygons`.
pub fn prefixed_alert(identifier: &str, polygons: &[&str]) -> String {
    let polygons: String = polygons
        .iter()
        .map(|p| format!("<cap:polygon>{p}</cap:polygon>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cap:alert xmlns:cap="urn:oasis:names:tc:emergency:cap:1.2">
  <cap:identifier>{identifier}</cap:identifier>
  <cap:sender>sachet@ndma.gov.in</cap:sender>
  <cap:sent>2024-07-01T06:00:00+05:30</cap:sent>
  <cap:status>Actual</cap:status>
  <cap:msgType>Alert</cap:msgType>
  <cap:scope>Public</cap:scope>
  <cap:info>
    <cap:category>Met</cap:category>
    <cap:event>Heavy Rain</cap:event>
    <cap:urgency>Expected</cap:urgency>
    <cap:severity>Moderate</cap:severity>
    <cap:certainty>Likely</cap:certainty>
    <cap:area>
      <cap:areaDesc>District {identifier}</cap:areaDesc>
      {polygons}
    </cap:area>
  </cap:info>
</cap:alert>"#
    )
}

/// Identifiers of `features`, in order
pub fn identifiers(features: &[capzip::Feature]) -> Vec<String> {
    features
        .iter()
        .filter_map(|f| f.property("identifier"))
        .map(str::to_string)
        .collect()
}

/// A reader whose first read waits until the gate is notified.
pub struct GatedReader {
    inner: MemoryReader,
    gate: Arc<Notify>,
    opened: std::sync::atomic::AtomicBool,
}

impl GatedReader {
    pub fn new(data: Vec<u8>, gate: Arc<Notify>) -> Self {
        Self {
            inner: MemoryReader::new(data),
            gate,
            opened: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ReadAt for GatedReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::sync::atomic::Ordering;

        if !self.opened.load(Ordering::SeqCst) {
            self.gate.notified().await;
            self.opened.store(true, Ordering::SeqCst);
        }
        self.inner.read_at(offset, buf).await
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }
}
