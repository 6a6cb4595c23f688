//! Triple-pattern identifier extraction.
//!
//! Trace logs reference query fragments by structured identifiers of the form
//! `TP(subject,predicate,object)`. This module parses those identifiers and
//! derives the two values the rest of the pipeline works with:
//!
//! - the **significant id**, the first non-zero component in the priority
//!   order subject, object, predicate, used as the pattern's grouping key;
//! - the **natural node**, `significant_id mod node_count`, the node the
//!   pattern would land on by plain hashing, absent any partitioning.

use crate::errors::QdictError;

/// A parsed triple-pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: i64,
    pub predicate: i64,
    pub object: i64,
}

impl TriplePattern {
    /// Parses an identifier of the form `TP(subject,predicate,object)`.
    ///
    /// The text before the first `(` is not inspected, so any prefix is
    /// tolerated; the three fields between the first `(` and the last `)`
    /// must be integers.
    pub fn parse(tp: &str) -> Result<Self, QdictError> {
        let malformed = || QdictError::MalformedIdentifier(tp.to_string());

        let open = tp.find('(').ok_or_else(malformed)?;
        let close = tp.rfind(')').ok_or_else(malformed)?;
        if close <= open {
            return Err(malformed());
        }

        let mut fields = tp[open + 1..close].split(',');
        let mut next_id = || -> Result<i64, QdictError> {
            fields
                .next()
                .and_then(|f| f.trim().parse::<i64>().ok())
                .ok_or_else(malformed)
        };

        let subject = next_id()?;
        let predicate = next_id()?;
        let object = next_id()?;
        if fields.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            subject,
            predicate,
            object,
        })
    }

    /// Returns the first non-zero component, checked in the priority order
    /// subject, object, predicate. If all three are zero the predicate
    /// (zero) is returned.
    pub fn significant_id(&self) -> i64 {
        if self.subject != 0 {
            self.subject
        } else if self.object != 0 {
            self.object
        } else {
            self.predicate
        }
    }
}

/// Parses `tp` and returns its significant id.
pub fn significant_id(tp: &str) -> Result<i64, QdictError> {
    Ok(TriplePattern::parse(tp)?.significant_id())
}

/// Returns the node `tp` would be placed on by plain hashing:
/// `significant_id mod node_count`.
///
/// `node_count` must be at least 1; this is enforced at configuration
/// validation before any pipeline stage runs.
pub fn natural_node(tp: &str, node_count: u32) -> Result<u32, QdictError> {
    let sig = significant_id(tp)?;
    Ok(sig.rem_euclid(i64::from(node_count)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_triple_pattern() {
        let tp = TriplePattern::parse("TP(3,5,7)").unwrap();
        assert_eq!(tp.subject, 3);
        assert_eq!(tp.predicate, 5);
        assert_eq!(tp.object, 7);
    }

    #[test]
    fn significant_id_prefers_subject_then_object_then_predicate() {
        assert_eq!(significant_id("TP(3,5,7)").unwrap(), 3);
        assert_eq!(significant_id("TP(0,5,7)").unwrap(), 7);
        assert_eq!(significant_id("TP(0,5,0)").unwrap(), 5);
        assert_eq!(significant_id("TP(0,0,0)").unwrap(), 0);
    }

    #[test]
    fn natural_node_uses_object_when_subject_is_zero() {
        assert_eq!(natural_node("TP(0,5,7)", 3).unwrap(), 7 % 3);
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in [
            "TP(1,2)",
            "TP(1,2,3,4)",
            "TP(a,b,c)",
            "TP 1,2,3",
            "TP)1,2,3(",
            "",
        ] {
            assert!(
                matches!(
                    TriplePattern::parse(bad),
                    Err(QdictError::MalformedIdentifier(_))
                ),
                "expected parse failure for {bad:?}"
            );
        }
    }
}
