use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// Build a DEFLATE-compressed ZIP archive from (name, contents) pairs.
pub fn deflated_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// An unprefixed CAP alert with one info and one area holding `polygons`.
pub fn bare_alert(identifier: &str, polygons: &[&str]) -> String {
    let polygons: String = polygons
        .iter()
        .map(|p| format!("<polygon>{p}</polygon>"))
        .collect();
    format!(
        "<alert><identifier>{identifier}</identifier><info><event>Test</event>\
         <area><areaDesc>Area {identifier}</areaDesc>{polygons}</area></info></alert>"
    )
}
