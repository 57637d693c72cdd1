//! Error types for document parsing and flattening.

/// Structural failures while reading or flattening a document.
///
/// None of these are recovered locally: a record that cannot be flattened
/// faithfully is reported rather than dropped or merged lossily.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The document text is not well-formed XML.
    #[error("failed to parse document: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// A tag has no `{uri}` prefix to strip.
    #[error("tag '{tag}' is not namespace-qualified")]
    MissingNamespace {
        /// The offending tag.
        tag: String,
    },

    /// A reserved generic tag appeared with no preceding element to qualify it.
    #[error("reserved tag '{tag}' has no preceding element to qualify it")]
    OrphanReservedTag {
        /// The reserved local name.
        tag: String,
    },

    /// A sub-classification block does not have the expected key/value pairs.
    #[error("malformed sub-classification entry {position}: {reason}")]
    MalformedSubClassification {
        /// Index of the offending child within the block.
        position: usize,
        /// Description of the problem.
        reason: String,
    },

    /// More repeated siblings than the counter pool can number.
    #[error("counter pool exhausted at tag '{tag}': {reason}")]
    CounterPoolExhausted {
        /// The repeated tag that could not be numbered.
        tag: String,
        /// Which bound was hit.
        reason: String,
    },

    /// A numbered field name collided with a literal tag of the same name.
    #[error("field '{key}' received {occurrences} values")]
    FieldCollision {
        /// The colliding field name.
        key: String,
        /// How many values were collected under it.
        occurrences: usize,
    },

    /// An element expected at a fixed position of the document is missing.
    #[error("missing element at {path}")]
    MissingElement {
        /// Positional path of the missing element.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_display() {
        let err = XmlError::Parse {
            reason: "unexpected end of stream".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse document: unexpected end of stream"
        );
    }

    #[test]
    fn missing_namespace_display() {
        let err = XmlError::MissingNamespace {
            tag: "Id".to_string(),
        };
        assert_eq!(err.to_string(), "tag 'Id' is not namespace-qualified");
    }

    #[test]
    fn counter_pool_display() {
        let err = XmlError::CounterPoolExhausted {
            tag: "Rate".to_string(),
            reason: "more than 100 occurrences".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Rate"));
        assert!(msg.contains("100 occurrences"));
    }

    #[test]
    fn field_collision_display() {
        let err = XmlError::FieldCollision {
            key: "Rate_2".to_string(),
            occurrences: 2,
        };
        assert_eq!(err.to_string(), "field 'Rate_2' received 2 values");
    }

    #[test]
    fn malformed_sub_classification_display() {
        let err = XmlError::MalformedSubClassification {
            position: 3,
            reason: "expected 2 children, found 1".to_string(),
        };
        assert!(err.to_string().contains("entry 3"));
    }

    #[test]
    fn missing_element_display() {
        let err = XmlError::MissingElement {
            path: "root[1][0][0]".to_string(),
        };
        assert_eq!(err.to_string(), "missing element at root[1][0][0]");
    }
}
