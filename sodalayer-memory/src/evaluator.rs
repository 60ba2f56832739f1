//! Filter evaluation for in-memory document matching.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document};

use sodalayer_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Comparable view of a BSON value.
///
/// Integers of either width compare exactly, so `2000` matches `2000_i64`. An integer is
/// widened to `f64` only when compared with a double.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect()
            ),
            _ => Comparable::Null, // Content never holds other types
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64) == *b,
            (Comparable::Number(a), Comparable::Int(b)) => *a == (*b as f64),
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Number(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}


/// Evaluates a filter expression against one document's top-level fields.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.document.contains_key(field) == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            return Ok(false);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
            FieldOp::Gte => matches!(left.partial_cmp(&right), Some(Ordering::Greater | Ordering::Equal)),
            FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
            FieldOp::Lte => matches!(left.partial_cmp(&right), Some(Ordering::Less | Ordering::Equal)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use sodalayer_core::query::Filter;

    fn matches(document: &Document, expr: Expr) -> bool {
        DocumentEvaluator::new(document)
            .evaluate(&expr)
            .unwrap()
    }

    #[test]
    fn numbers_compare_across_widths() {
        let document = doc! { "id": 2000_i32 };

        assert!(matches(&document, Filter::eq("id", 2000_i64)));
        assert!(matches(&document, Filter::gte("id", 1999.5)));
        assert!(!matches(&document, Filter::lt("id", 2000)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let document = doc! { "n": 9_007_199_254_740_993_i64 };

        assert!(!matches(&document, Filter::eq("n", 9_007_199_254_740_992_i64)));
        assert!(matches(&document, Filter::ne("n", 9_007_199_254_740_992_i64)));
        assert!(matches(&document, Filter::gt("n", 9_007_199_254_740_992_i64)));
        assert!(matches(&document, Filter::eq("n", 9_007_199_254_740_993_i64)));
        assert!(!matches(&document, Filter::lt("n", 9_007_199_254_740_993_i64)));
    }

    #[test]
    fn missing_fields_never_match_comparisons() {
        let document = doc! { "name": "Paul" };

        assert!(!matches(&document, Filter::eq("office", "Singapore")));
        assert!(!matches(&document, Filter::ne("office", "Singapore")));
        assert!(matches(&document, Filter::not_exists("office")));
    }

    #[test]
    fn logical_combinations() {
        let document = doc! { "name": "Paul", "office": "Singapore" };

        assert!(matches(
            &document,
            Filter::eq("name", "Paul").and(Filter::eq("office", "Singapore"))
        ));
        assert!(matches(
            &document,
            Filter::or([Filter::eq("name", "Mary"), Filter::exists("office")])
        ));
        assert!(!matches(&document, Filter::eq("name", "Paul").not()));
    }

    #[test]
    fn mismatched_types_do_not_order() {
        let document = doc! { "id": "2000" };

        assert!(!matches(&document, Filter::gt("id", 1)));
        assert!(!matches(&document, Filter::eq("id", 2000)));
    }
}
