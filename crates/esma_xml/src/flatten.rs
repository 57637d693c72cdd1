//! Flattening of one record's subtree into a [`FlatRecord`].
//!
//! Two strategies are supported:
//!
//! - [`Strategy::Recursive`] merges the leaves of each branch, qualifying
//!   every leaf with its parent's tag. Colliding keys resolve **last write
//!   wins**.
//! - [`Strategy::Counting`] walks every node in document order and numbers
//!   repeated tags `Tag`, `Tag_2`, `Tag_3`, ... from a bounded
//!   [`CounterPool`]. Nothing is overwritten.

use esma_common::FlatRecord;
use indexmap::IndexMap;

use crate::element::Element;
use crate::error::XmlError;
use crate::namespace::local_name;

/// Tag of blocks that encode their fields as (name, value) text pairs.
pub const SUB_CLASSIFICATION_TAG: &str = "DerivSubClss";

/// First suffix handed out to a repeated tag.
const FIRST_SUFFIX: usize = 2;

/// Bounds on the numbering of repeated tags in [`Strategy::Counting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPool {
    /// How many distinct tags may repeat within one record.
    pub max_groups: usize,
    /// Highest suffix a repeated tag may receive.
    pub max_suffix: usize,
}

impl Default for CounterPool {
    fn default() -> Self {
        Self {
            max_groups: 15,
            max_suffix: 100,
        }
    }
}

/// How a subtree is turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Branch-wise merge, last write wins.
    Recursive,
    /// Document-order walk with numbered duplicates.
    Counting(CounterPool),
}

/// A configured flattener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flattener {
    strategy: Strategy,
}

impl Flattener {
    /// Creates a flattener using `strategy`.
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// A flattener using [`Strategy::Recursive`].
    pub fn recursive() -> Self {
        Self::new(Strategy::Recursive)
    }

    /// A flattener using [`Strategy::Counting`] with the default pool.
    pub fn counting() -> Self {
        Self::new(Strategy::Counting(CounterPool::default()))
    }

    /// The configured strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Flattens the subtree rooted at `element` into one record.
    pub fn flatten(&self, element: &Element) -> Result<FlatRecord, XmlError> {
        match self.strategy {
            Strategy::Recursive => flatten_recursive(element, None),
            Strategy::Counting(pool) => flatten_counting(element, pool),
        }
    }
}

/// Flattens `element` by recursive merge.
///
/// A leaf yields `{tag: text}`, or `{ancestor_tag}_{tag}` when an ancestor is
/// given. A [`SUB_CLASSIFICATION_TAG`] block yields its first child's
/// tag/text, then one field per following child, keyed by that child's first
/// grandchild's *text* and valued by its second grandchild's text. Any other
/// node merges its children's records in order, passing its own tag down;
/// a later child's key overwrites an earlier one.
///
/// Tags are compared by local name, so the tree may or may not have been
/// normalized first.
pub fn flatten_recursive(element: &Element, ancestor: Option<&str>) -> Result<FlatRecord, XmlError> {
    let tag = local_name(&element.tag);

    if element.is_leaf() {
        let key = match ancestor {
            Some(parent) => format!("{}_{tag}", local_name(parent)),
            None => tag.to_string(),
        };
        let mut record = FlatRecord::new();
        record.insert(key, element.text.clone());
        return Ok(record);
    }

    if tag == SUB_CLASSIFICATION_TAG {
        return flatten_sub_classification(element);
    }

    let mut record = FlatRecord::new();
    for child in &element.children {
        record.merge(flatten_recursive(child, Some(&element.tag))?);
    }
    Ok(record)
}

fn flatten_sub_classification(element: &Element) -> Result<FlatRecord, XmlError> {
    let mut record = FlatRecord::new();
    let mut children = element.children.iter().enumerate();

    if let Some((_, first)) = children.next() {
        record.insert(local_name(&first.tag), first.text.clone());
    }

    for (position, pair) in children {
        let (Some(key), Some(value)) = (pair.child(0), pair.child(1)) else {
            return Err(XmlError::MalformedSubClassification {
                position,
                reason: format!("expected a name and a value, found {} children", pair.children.len()),
            });
        };
        let Some(name) = key.text.as_deref() else {
            return Err(XmlError::MalformedSubClassification {
                position,
                reason: "name element has no text".to_string(),
            });
        };
        record.insert(name, value.text.clone());
    }
    Ok(record)
}

/// Flattens `element` by walking every node, the root included, in document
/// order.
///
/// Nodes without text, or whose text is only whitespace, are skipped. The
/// first occurrence of a tag is stored under the tag itself; later ones under
/// `{tag}_2`, `{tag}_3`, ... Values are collected per key and collapsed to a
/// scalar once the walk is done.
///
/// Tags are used as-is, so namespaces should be normalized beforehand.
pub fn flatten_counting(element: &Element, pool: CounterPool) -> Result<FlatRecord, XmlError> {
    let mut values: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut next_suffix: IndexMap<&str, usize> = IndexMap::new();

    for node in element.iter() {
        let Some(text) = node.text.as_deref() else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let tag = node.tag.as_str();
        let key = if !values.contains_key(tag) {
            tag.to_string()
        } else {
            if !next_suffix.contains_key(tag) && next_suffix.len() >= pool.max_groups {
                return Err(XmlError::CounterPoolExhausted {
                    tag: tag.to_string(),
                    reason: format!("more than {} distinct repeated tags", pool.max_groups),
                });
            }
            let suffix = next_suffix.entry(tag).or_insert(FIRST_SUFFIX);
            if *suffix > pool.max_suffix {
                return Err(XmlError::CounterPoolExhausted {
                    tag: tag.to_string(),
                    reason: format!("suffix would exceed {}", pool.max_suffix),
                });
            }
            let key = format!("{tag}_{suffix}");
            *suffix += 1;
            key
        };
        values.entry(key).or_default().push(text.to_string());
    }

    collapse(values)
}

fn collapse(values: IndexMap<String, Vec<String>>) -> Result<FlatRecord, XmlError> {
    let mut record = FlatRecord::new();
    for (key, mut list) in values {
        if list.len() != 1 {
            return Err(XmlError::FieldCollision {
                key,
                occurrences: list.len(),
            });
        }
        record.insert(key, list.pop());
    }
    Ok(record)
}
