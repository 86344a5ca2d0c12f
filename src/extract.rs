//! Attachment text extraction
//!
//! Dispatches on the caller-declared media type. Extraction never fails the
//! surrounding tool call: unsupported types and extractor errors become
//! bracketed placeholder text inside a successful result.

/// Word 2007+ document media type
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Legacy Word media type, routed to the same extractor
pub const MIME_MSWORD: &str = "application/msword";

/// Extract readable text from attachment bytes
pub fn extract_text(bytes: &[u8], mime_type: &str) -> String {
    match mime_type {
        "text/plain" => String::from_utf8_lossy(bytes).into_owned(),
        "application/pdf" => extract_pdf(bytes),
        MIME_DOCX | MIME_MSWORD => extract_docx(bytes),
        other => format!("[Unsupported file type: {other}]"),
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> String {
    // pdf-extract can panic on hostile input
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => pages.join("\n"),
        Ok(Err(e)) => format!("[Error extracting PDF text: {e}]"),
        Err(_) => "[Error extracting PDF text: parser aborted]".to_owned(),
    }
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> String {
    "[PDF text extraction is not available in this build]".to_owned()
}

#[cfg(feature = "docx")]
fn extract_docx(bytes: &[u8]) -> String {
    match docx::paragraphs(bytes) {
        Ok(paragraphs) => paragraphs.join("\n"),
        Err(e) => format!("[Error extracting DOCX text: {e}]"),
    }
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_bytes: &[u8]) -> String {
    "[DOCX text extraction is not available in this build]".to_owned()
}

#[cfg(feature = "docx")]
mod docx {
    use std::io::{Cursor, Read};

    use quick_xml::Reader;
    use quick_xml::events::Event;

    /// Paragraph texts of `word/document.xml`, in document order
    pub fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| e.to_string())?
            .read_to_string(&mut xml)
            .map_err(|e| e.to_string())?;

        let mut reader = Reader::from_str(&xml);
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        let mut in_text = false;

        loop {
            match reader.read_event().map_err(|e| e.to_string())? {
                Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
                Event::End(e) => match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"w:tab" => current.push('\t'),
                    b"w:br" | b"w:cr" => current.push('\n'),
                    b"w:p" => paragraphs.push(String::new()),
                    _ => {}
                },
                Event::Text(t) if in_text => {
                    current.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::extract_text;

    #[test]
    fn plain_text_is_decoded_lossily() {
        assert_eq!(extract_text(b"hello", "text/plain"), "hello");
        assert_eq!(extract_text(&[b'a', 0xfe], "text/plain"), "a\u{fffd}");
    }

    #[test]
    fn unsupported_type_yields_placeholder() {
        assert_eq!(
            extract_text(&[0x89, b'P', b'N', b'G'], "image/png"),
            "[Unsupported file type: image/png]"
        );
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn corrupt_pdf_yields_error_placeholder() {
        let out = extract_text(b"%PDF-1.4 definitely not a pdf", "application/pdf");
        assert!(out.starts_with("[Error extracting PDF text"), "{out}");
    }

    #[cfg(feature = "docx")]
    #[test]
    fn docx_paragraphs_are_joined_with_newlines() {
        use std::io::Write;

        let document = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Quarterly</w:t></w:r><w:r><w:t xml:space="preserve"> report</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Profit &amp; loss</w:t><w:tab/><w:t>up</w:t></w:r></w:p>
</w:body></w:document>"#;

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            writer.start_file("word/document.xml", options).expect("start entry");
            writer.write_all(document.as_bytes()).expect("write entry");
            writer.finish().expect("finish archive");
        }

        let out = extract_text(buf.get_ref(), super::MIME_DOCX);
        assert_eq!(out, "Quarterly report\n\nProfit & loss\tup");
    }

    #[cfg(feature = "docx")]
    #[test]
    fn non_zip_word_file_yields_error_placeholder() {
        let out = extract_text(b"\xd0\xcf\x11\xe0legacy", super::MIME_MSWORD);
        assert!(out.starts_with("[Error extracting DOCX text"), "{out}");
    }
}
