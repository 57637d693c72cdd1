//! Namespace stripping and generic-tag qualification.

use crate::element::Element;
use crate::error::XmlError;

/// Local names that recur under many unrelated parents with the same meaning
/// ("amount", "number"). They are qualified with the preceding tag so they
/// stay distinct once flattened.
pub const RESERVED_TAGS: &[&str] = &["Amt", "Nb"];

/// Strips the `{uri}` prefix from an expanded tag.
///
/// Fails if the tag carries no namespace or nothing follows the prefix.
pub fn strip_namespace(tag: &str) -> Result<&str, XmlError> {
    let missing = || XmlError::MissingNamespace {
        tag: tag.to_string(),
    };
    let rest = tag.strip_prefix('{').ok_or_else(missing)?;
    let (_, local) = rest.split_once('}').ok_or_else(missing)?;
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return Err(missing());
    }
    Ok(local)
}

/// Returns the local part of a tag, whether or not it is namespace-qualified.
pub fn local_name(tag: &str) -> &str {
    strip_namespace(tag).unwrap_or(tag)
}

/// Rewrites every tag of the tree to its local name, in place.
///
/// Tags in [`RESERVED_TAGS`] become `{previous}_{local}`, where `previous` is
/// the already-rewritten tag of the element visited just before in document
/// order. That is usually, but not necessarily, the structural parent; the
/// reserved tags only occur as first children in the supported documents.
///
/// The rewrite is destructive and must run exactly once per tree: a second
/// pass fails with [`XmlError::MissingNamespace`].
pub fn normalize_namespaces(root: &mut Element) -> Result<(), XmlError> {
    let mut previous: Option<String> = None;
    visit(root, &mut previous)
}

fn visit(element: &mut Element, previous: &mut Option<String>) -> Result<(), XmlError> {
    let local = strip_namespace(&element.tag)?;
    let tag = if RESERVED_TAGS.contains(&local) {
        let Some(prev) = previous.as_deref() else {
            return Err(XmlError::OrphanReservedTag {
                tag: local.to_string(),
            });
        };
        format!("{prev}_{local}")
    } else {
        local.to_string()
    };
    element.tag = tag;
    *previous = Some(element.tag.clone());

    for child in &mut element.children {
        visit(child, previous)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(local: &str) -> String {
        format!("{{urn:iso:std:iso:20022:tech:xsd:auth.041.001.01}}{local}")
    }

    #[test]
    fn strip_namespace_basic() {
        assert_eq!(strip_namespace(&ns("Id")).unwrap(), "Id");
    }

    #[test]
    fn strip_namespace_rejects_bare_tag() {
        assert!(matches!(
            strip_namespace("Id"),
            Err(XmlError::MissingNamespace { .. })
        ));
        assert!(strip_namespace("{urn:x}").is_err());
        assert!(strip_namespace("{urn:x").is_err());
    }

    #[test]
    fn local_name_is_lenient() {
        assert_eq!(local_name(&ns("Mthdlgy")), "Mthdlgy");
        assert_eq!(local_name("Mthdlgy"), "Mthdlgy");
    }

    #[test]
    fn normalize_strips_every_tag() {
        let mut tree = Element::new(ns("Document"))
            .with_child(Element::new(ns("Id")).with_text("X"))
            .with_child(Element::new(ns("Sttstcs")).with_child(Element::new(ns("Avrg"))));
        normalize_namespaces(&mut tree).unwrap();
        let tags: Vec<_> = tree.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["Document", "Id", "Sttstcs", "Avrg"]);
    }

    #[test]
    fn reserved_tags_take_previous_tag_as_prefix() {
        let mut tree = Element::new(ns("Sttstcs"))
            .with_child(
                Element::new(ns("TtlNbOfTxsExctd")).with_child(Element::new(ns("Nb")).with_text("7")),
            )
            .with_child(
                Element::new(ns("TtlVolOfTxsExctd")).with_child(Element::new(ns("Amt")).with_text("1.5")),
            );
        normalize_namespaces(&mut tree).unwrap();
        let tags: Vec<_> = tree.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec![
                "Sttstcs",
                "TtlNbOfTxsExctd",
                "TtlNbOfTxsExctd_Nb",
                "TtlVolOfTxsExctd",
                "TtlVolOfTxsExctd_Amt",
            ]
        );
    }

    #[test]
    fn reserved_prefix_uses_iteration_order_not_structure() {
        // `Amt` follows the leaf `Ccy` in pre-order, so it is qualified with
        // `Ccy` even though its structural parent is `Pric`.
        let mut tree = Element::new(ns("Pric"))
            .with_child(Element::new(ns("Ccy")).with_text("EUR"))
            .with_child(Element::new(ns("Amt")).with_text("10"));
        normalize_namespaces(&mut tree).unwrap();
        assert_eq!(tree.children[1].tag, "Ccy_Amt");
    }

    #[test]
    fn reserved_root_is_an_error() {
        let mut tree = Element::new(ns("Amt"));
        assert!(matches!(
            normalize_namespaces(&mut tree),
            Err(XmlError::OrphanReservedTag { .. })
        ));
    }

    #[test]
    fn second_pass_fails() {
        let mut tree = Element::new(ns("Document")).with_child(Element::new(ns("Id")));
        normalize_namespaces(&mut tree).unwrap();
        assert!(matches!(
            normalize_namespaces(&mut tree),
            Err(XmlError::MissingNamespace { .. })
        ));
    }

    #[test]
    fn unqualified_descendant_is_an_error() {
        let mut tree = Element::new(ns("Document")).with_child(Element::new("Id"));
        let err = normalize_namespaces(&mut tree).unwrap_err();
        assert!(matches!(err, XmlError::MissingNamespace { tag } if tag == "Id"));
    }
}
