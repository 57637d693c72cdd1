//! Record-set assembly for whole documents.

use esma_common::{FlatRecord, RecordSet};

use crate::element::{parse_document, Element};
use crate::error::XmlError;
use crate::flatten::{flatten_counting, flatten_recursive, CounterPool};
use crate::namespace::normalize_namespaces;

/// Tags of the repeating blocks in transparency files, in lookup order. The
/// second is only consulted when the first does not occur at all.
pub const BLOCK_TAGS: &[&str] = &["NonEqtyTrnsprncyData", "EqtyTrnsprncyData"];

/// Receives `(done, total)` updates while a document's records are flattened.
pub trait Progress {
    /// Called after each record.
    fn advance(&self, done: usize, total: usize);
}

impl<F: Fn(usize, usize)> Progress for F {
    fn advance(&self, done: usize, total: usize) {
        self(done, total)
    }
}

/// A [`Progress`] that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&self, _done: usize, _total: usize) {}
}

/// Document shape, selecting how records are located and flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Transparency files: one record per [`BLOCK_TAGS`] element, flattened
    /// by tag counting after namespace normalization.
    Blocks(CounterPool),
    /// Reference-data files: one record per payload entry at a fixed
    /// position, flattened by recursive merge and completed with the header
    /// fields.
    Positional,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Blocks(CounterPool::default())
    }
}

/// Parses `xml` and assembles its records according to `layout`.
pub fn read_document(
    xml: &str,
    layout: Layout,
    progress: &dyn Progress,
) -> Result<RecordSet, XmlError> {
    let mut root = parse_document(xml)?;
    match layout {
        Layout::Blocks(pool) => read_transparency_blocks(&mut root, pool, progress),
        Layout::Positional => read_positional(&root, progress),
    }
}

/// Normalizes `root` and flattens every transparency block.
///
/// A document with no blocks yields an empty record set.
pub fn read_transparency_blocks(
    root: &mut Element,
    pool: CounterPool,
    progress: &dyn Progress,
) -> Result<RecordSet, XmlError> {
    normalize_namespaces(root)?;

    let root = &*root;
    let blocks: Vec<&Element> = BLOCK_TAGS
        .iter()
        .map(|tag| root.find_all(tag).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    let total = blocks.len();
    tracing::debug!(target = "esma.xml", blocks = total, "flattening transparency blocks");

    let mut records = Vec::with_capacity(total);
    for (i, block) in blocks.into_iter().enumerate() {
        records.push(flatten_counting(block, pool)?);
        progress.advance(i + 1, total);
    }
    Ok(records)
}

/// Flattens a reference-data document.
///
/// Records are the children of `root[1][0][0]` except the first; the header
/// is `root[0][0]`. Header fields are added to every record that does not
/// already carry them.
pub fn read_positional(root: &Element, progress: &dyn Progress) -> Result<RecordSet, XmlError> {
    let header = descend(root, &[0, 0])?;
    let payload = descend(root, &[1, 0, 0])?;

    let header = flatten_recursive(header, None)?;
    let entries = payload.children.get(1..).unwrap_or_default();
    let total = entries.len();
    tracing::debug!(target = "esma.xml", entries = total, "flattening reference data");

    let mut records = Vec::with_capacity(total);
    for (i, entry) in entries.iter().enumerate() {
        let mut record = flatten_recursive(entry, None)?;
        complete_with(&mut record, &header);
        records.push(record);
        progress.advance(i + 1, total);
    }
    Ok(records)
}

fn complete_with(record: &mut FlatRecord, header: &FlatRecord) {
    for (key, value) in header.iter() {
        if !record.contains_key(key) {
            record.insert(key, value.map(str::to_string));
        }
    }
}

fn descend<'a>(root: &'a Element, path: &[usize]) -> Result<&'a Element, XmlError> {
    let mut node = root;
    for (depth, &index) in path.iter().enumerate() {
        node = node.child(index).ok_or_else(|| XmlError::MissingElement {
            path: path[..=depth]
                .iter()
                .fold(String::from("root"), |acc, i| format!("{acc}[{i}]")),
        })?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const NS: &str = "urn:iso:std:iso:20022:tech:xsd:auth.041.001.01";

    fn transparency_doc(blocks: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<BizData xmlns="urn:iso:std:iso:20022:tech:xsd:head.003.001.01">
  <Pyld>
    <Document xmlns="{NS}">
      <FinInstrmRptgEqtyTrdgActvtyRslt>
{blocks}
      </FinInstrmRptgEqtyTrdgActvtyRslt>
    </Document>
  </Pyld>
</BizData>"#
        )
    }

    const EQUITY_BLOCK: &str = r#"
        <EqtyTrnsprncyData>
          <Id>DE0005140008</Id>
          <FinInstrmClssfctn>SHRS</FinInstrmClssfctn>
          <Sttstcs>
            <TtlNbOfTxsExctd><Nb>1200</Nb></TtlNbOfTxsExctd>
            <TtlVolOfTxsExctd><Amt>5000000.5</Amt></TtlVolOfTxsExctd>
          </Sttstcs>
        </EqtyTrnsprncyData>"#;

    #[test]
    fn blocks_are_flattened_with_qualified_generic_tags() {
        let xml = transparency_doc(&format!("{EQUITY_BLOCK}{EQUITY_BLOCK}"));
        let records = read_document(&xml, Layout::default(), &NoProgress).unwrap();
        assert_eq!(records.len(), 2);
        let r = &records[0];
        assert_eq!(r.value("Id"), Some("DE0005140008"));
        assert_eq!(r.value("FinInstrmClssfctn"), Some("SHRS"));
        assert_eq!(r.value("TtlNbOfTxsExctd_Nb"), Some("1200"));
        assert_eq!(r.value("TtlVolOfTxsExctd_Amt"), Some("5000000.5"));
        assert_eq!(records[0], records[1]);
    }

    #[test]
    fn non_equity_blocks_take_precedence() {
        let blocks = format!(
            "{EQUITY_BLOCK}<NonEqtyTrnsprncyData><Id>XS0001</Id><Rate>1</Rate><Rate>2</Rate></NonEqtyTrnsprncyData>"
        );
        let records = read_document(&transparency_doc(&blocks), Layout::default(), &NoProgress).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("Id"), Some("XS0001"));
        assert_eq!(records[0].value("Rate_2"), Some("2"));
    }

    #[test]
    fn document_without_blocks_is_empty() {
        let records = read_document(&transparency_doc(""), Layout::default(), &NoProgress).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn unqualified_document_is_rejected() {
        let err = read_document("<Doc><EqtyTrnsprncyData/></Doc>", Layout::default(), &NoProgress)
            .unwrap_err();
        assert!(matches!(err, XmlError::MissingNamespace { .. }));
    }

    #[test]
    fn progress_reports_every_block() {
        let xml = transparency_doc(&format!("{EQUITY_BLOCK}{EQUITY_BLOCK}{EQUITY_BLOCK}"));
        let seen = RefCell::new(Vec::new());
        let progress = |done: usize, total: usize| seen.borrow_mut().push((done, total));
        read_document(&xml, Layout::default(), &progress).unwrap();
        assert_eq!(seen.into_inner(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn reading_twice_is_deterministic() {
        let xml = transparency_doc(EQUITY_BLOCK);
        let a = read_document(&xml, Layout::default(), &NoProgress).unwrap();
        let b = read_document(&xml, Layout::default(), &NoProgress).unwrap();
        assert_eq!(a, b);
    }

    const REFERENCE_DOC: &str = r#"<BizData xmlns="urn:head">
  <Hdr><AppHdr><Fr>ESMA</Fr><BizMsgIdr>FULINS_E_20240203</BizMsgIdr></AppHdr></Hdr>
  <Pyld>
    <Document xmlns="urn:auth.017">
      <FinInstrmRptgRefDataRpt>
        <RptHdr><RptgNtty>EU</RptgNtty></RptHdr>
        <RefData>
          <FinInstrmGnlAttrbts><Id>DE0001</Id><FullNm>Bund 2030</FullNm></FinInstrmGnlAttrbts>
          <Issr>529900</Issr>
        </RefData>
        <RefData>
          <FinInstrmGnlAttrbts><Id>DE0002</Id></FinInstrmGnlAttrbts>
          <Fr>override</Fr>
        </RefData>
      </FinInstrmRptgRefDataRpt>
    </Document>
  </Pyld>
</BizData>"#;

    #[test]
    fn positional_layout_skips_report_header_and_adds_document_header() {
        let records = read_document(REFERENCE_DOC, Layout::Positional, &NoProgress).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.value("FinInstrmGnlAttrbts_Id"), Some("DE0001"));
        assert_eq!(first.value("FinInstrmGnlAttrbts_FullNm"), Some("Bund 2030"));
        assert_eq!(first.value("RefData_Issr"), Some("529900"));
        assert_eq!(first.value("AppHdr_Fr"), Some("ESMA"));
        assert_eq!(first.value("AppHdr_BizMsgIdr"), Some("FULINS_E_20240203"));
        assert!(!first.contains_key("RptHdr_RptgNtty"));

        assert_eq!(records[1].value("FinInstrmGnlAttrbts_Id"), Some("DE0002"));
        assert_eq!(records[1].value("RefData_Fr"), Some("override"));
    }

    #[test]
    fn positional_layout_reports_missing_payload() {
        let err = read_document("<a><b><c/></b></a>", Layout::Positional, &NoProgress).unwrap_err();
        assert!(matches!(err, XmlError::MissingElement { path } if path == "root[1]"));
    }
}
