//! Attribute-encoded listings, as returned by the register search service.
//!
//! Each `<doc>` element is one record; its fields are descendants carrying a
//! `name` attribute:
//!
//! ```xml
//! <doc>
//!   <str name="file_name">FULINS_E_20240203_01of02.zip</str>
//!   <date name="publication_date">2024-02-03T00:00:00Z</date>
//! </doc>
//! ```

use esma_common::{FlatRecord, RecordSet};

use crate::element::Element;
use crate::namespace::local_name;

/// Tag of one listing entry.
const DOC_TAG: &str = "doc";

/// Attribute holding a field's name.
const NAME_ATTRIBUTE: &str = "name";

/// Collects one record per `doc` element found under `root`.
///
/// A field's value is the concatenated text of its element. Later fields
/// with the same name overwrite earlier ones.
pub fn read_listing(root: &Element) -> RecordSet {
    root.iter()
        .filter(|e| local_name(&e.tag) == DOC_TAG)
        .map(read_doc)
        .collect()
}

fn read_doc(doc: &Element) -> FlatRecord {
    let mut record = FlatRecord::new();
    for field in doc.iter().skip(1) {
        if let Some(name) = field.attribute(NAME_ATTRIBUTE) {
            record.insert(name, Some(field.text_content()));
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::parse_document;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <lst name="responseHeader"><int name="status">0</int></lst>
  <result name="response" numFound="2" start="0">
    <doc>
      <str name="file_name">FULECR_20250308_E_1of1.zip</str>
      <str name="file_type">Full</str>
      <str name="download_link">http://fitrs.esma.europa.eu/fitrs/FULECR_20250308_E_1of1.zip</str>
    </doc>
    <doc>
      <str name="file_name">DLTECR_20250310_1of1.zip</str>
      <str name="file_type">Delta</str>
      <str name="checksum"></str>
    </doc>
  </result>
</response>"#;

    #[test]
    fn reads_one_record_per_doc() {
        let root = parse_document(RESPONSE).unwrap();
        let records = read_listing(&root);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("file_type"), Some("Full"));
        assert_eq!(
            records[0].value("download_link"),
            Some("http://fitrs.esma.europa.eu/fitrs/FULECR_20250308_E_1of1.zip")
        );
        assert!(!records[0].contains_key("status"));
    }

    #[test]
    fn empty_field_is_empty_string() {
        let root = parse_document(RESPONSE).unwrap();
        let records = read_listing(&root);
        assert_eq!(records[1].value("checksum"), Some(""));
        assert!(!records[1].contains_key("download_link"));
    }

    #[test]
    fn array_fields_concatenate() {
        let root = parse_document(
            r#"<result><doc><arr name="tags"><str>a</str><str>b</str></arr></doc></result>"#,
        )
        .unwrap();
        let records = read_listing(&root);
        assert_eq!(records[0].value("tags"), Some("ab"));
    }

    #[test]
    fn no_docs_gives_empty_set() {
        let root = parse_document("<response><result numFound=\"0\"/></response>").unwrap();
        assert!(read_listing(&root).is_empty());
    }
}
