use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::error::{DocumentError, DocumentResult};

pub const DOCUMENT_PATH: &str = "word/document.xml";

/// A `.docx` file is a zip container of OOXML parts. Only
/// `word/document.xml` is ever edited; every other part is carried through
/// untouched so styles, headers and media survive a round trip.
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    pub fn open(bytes: &[u8]) -> DocumentResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        let package = DocxPackage { entries };
        if package.entry(DOCUMENT_PATH).is_none() {
            return Err(DocumentError::Package(format!(
                "missing {} part",
                DOCUMENT_PATH
            )));
        }

        Ok(package)
    }

    pub fn document_xml(&self) -> DocumentResult<String> {
        let data = self
            .entry(DOCUMENT_PATH)
            .ok_or_else(|| DocumentError::Package(format!("missing {} part", DOCUMENT_PATH)))?;
        Ok(String::from_utf8(data.to_vec())?)
    }

    pub fn set_document_xml(&mut self, xml: String) {
        for (name, data) in &mut self.entries {
            if name == DOCUMENT_PATH {
                *data = xml.into_bytes();
                return;
            }
        }
        self.entries.push((DOCUMENT_PATH.to_string(), xml.into_bytes()));
    }

    pub fn save(&self) -> DocumentResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        // Fixed timestamp keeps identical requests byte-identical.
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for (name, data) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Builds the smallest valid document around the given `w:body` content.
    /// Used by tests and template scaffolding.
    pub fn minimal(body: &str) -> Self {
        let content_types = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#
        );
        let rels = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"</Relationships>"#
        );
        let document = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                r#"<w:body>{}<w:sectPr/></w:body></w:document>"#
            ),
            body
        );

        DocxPackage {
            entries: vec![
                ("[Content_Types].xml".to_string(), content_types.as_bytes().to_vec()),
                ("_rels/.rels".to_string(), rels.as_bytes().to_vec()),
                (DOCUMENT_PATH.to_string(), document.into_bytes()),
            ],
        }
    }

    fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }
}
