//! In-memory EPUB fixtures for unit tests

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::archive::EpubArchive;

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

/// Smallest valid PNG: 1x1 transparent pixel
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Route `tracing` output to the test harness; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Zip the given members in order
pub fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn package_document(manifest: &str, spine: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>Test Book</dc:title>
    </metadata>
    <manifest>
{manifest}
    </manifest>
    <spine>
{spine}
    </spine>
</package>"#
    )
}

pub fn chapter(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
    <title>Chapter</title>
    <link rel="stylesheet" type="text/css" href="../Styles/style.css"/>
    <script src="../Scripts/reader.js"></script>
</head>
<body>{body}</body>
</html>"#
    )
}

/// Two chapters, one shared stylesheet and one image referenced from chapter 1
pub fn two_chapter_book() -> EpubArchive {
    let opf = package_document(
        r#"        <item id="css" href="Styles/style.css" media-type="text/css"/>
        <item id="ch1" href="Text/ch1.xhtml" media-type="application/xhtml+xml"/>
        <item id="ch2" href="Text/ch2.xhtml" media-type="application/xhtml+xml"/>
        <item id="img" href="Images/pixel.png" media-type="image/png"/>"#,
        r#"        <itemref idref="ch1"/>
        <itemref idref="ch2"/>"#,
    );

    EpubArchive::from_members([
        ("mimetype", b"application/epub+zip".to_vec()),
        ("META-INF/container.xml", CONTAINER_XML.as_bytes().to_vec()),
        ("OEBPS/content.opf", opf.into_bytes()),
        (
            "OEBPS/Styles/style.css",
            b"body { margin: 0; }\np, li { color: #333; }\n".to_vec(),
        ),
        (
            "OEBPS/Text/ch1.xhtml",
            chapter(r#"<h1>One</h1><p><img src="../Images/pixel.png" alt="dot"/></p>"#)
                .into_bytes(),
        ),
        (
            "OEBPS/Text/ch2.xhtml",
            chapter("<h1>Two</h1><p>Second chapter.</p>").into_bytes(),
        ),
        ("OEBPS/Images/pixel.png", PNG_PIXEL.to_vec()),
    ])
}

/// Decode the payload of a `data:<type>;base64,` URI
pub fn decode_data_uri(uri: &str) -> (String, Vec<u8>) {
    use base64::Engine;

    let rest = uri.strip_prefix("data:").expect("not a data URI");
    let (media_type, payload) = rest.split_once(";base64,").expect("not base64");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .expect("invalid base64");
    (media_type.to_string(), bytes)
}
