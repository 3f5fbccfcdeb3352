//! Declarative per-column predicates.
//!
//! One spec describes what a single column must satisfy. Specs on
//! different columns AND together at the query layer; [`PredicateSpec::AnyOf`]
//! gives OR semantics within one column's spec, recursively; scalars,
//! ranges and patterns may be mixed inside one list.

use hayloft_codec::TypedValue;
use hayloft_store::CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateSpec {
    /// Exact value match.
    Eq(TypedValue),
    /// Column missing from the row, or holding an empty value.
    Absent,
    /// Bounded comparison; at least one bound must be present.
    Range {
        lower: Option<TypedValue>,
        lower_inclusive: bool,
        upper: Option<TypedValue>,
        upper_inclusive: bool,
    },
    /// OR of the nested specs.
    AnyOf(Vec<PredicateSpec>),
    /// AND of the nested specs; comparator maps compile to this.
    AllOf(Vec<PredicateSpec>),
    /// Single comparator against one value.
    Compare { op: CompareOp, value: TypedValue },
    /// Regex over the value decoded as UTF-8.
    Pattern {
        pattern: String,
        case_insensitive: bool,
    },
}

pub fn eq(value: impl Into<TypedValue>) -> PredicateSpec {
    PredicateSpec::Eq(value.into())
}

pub fn absent() -> PredicateSpec {
    PredicateSpec::Absent
}

/// `lower <= value <= upper`.
pub fn between(lower: impl Into<TypedValue>, upper: impl Into<TypedValue>) -> PredicateSpec {
    PredicateSpec::Range {
        lower: Some(lower.into()),
        lower_inclusive: true,
        upper: Some(upper.into()),
        upper_inclusive: true,
    }
}

/// `lower <= value < upper`.
pub fn between_exclusive(
    lower: impl Into<TypedValue>,
    upper: impl Into<TypedValue>,
) -> PredicateSpec {
    PredicateSpec::Range {
        lower: Some(lower.into()),
        lower_inclusive: true,
        upper: Some(upper.into()),
        upper_inclusive: false,
    }
}

pub fn gt(value: impl Into<TypedValue>) -> PredicateSpec {
    compare(CompareOp::Gt, value)
}

pub fn gte(value: impl Into<TypedValue>) -> PredicateSpec {
    compare(CompareOp::Gte, value)
}

pub fn lt(value: impl Into<TypedValue>) -> PredicateSpec {
    compare(CompareOp::Lt, value)
}

pub fn lte(value: impl Into<TypedValue>) -> PredicateSpec {
    compare(CompareOp::Lte, value)
}

pub fn ne(value: impl Into<TypedValue>) -> PredicateSpec {
    compare(CompareOp::Ne, value)
}

/// Excludes every listed value: a NOR group, compiled as ANDed `Ne`s.
pub fn ne_any<T: Into<TypedValue>>(values: impl IntoIterator<Item = T>) -> PredicateSpec {
    PredicateSpec::AllOf(values.into_iter().map(ne).collect())
}

fn compare(op: CompareOp, value: impl Into<TypedValue>) -> PredicateSpec {
    PredicateSpec::Compare {
        op,
        value: value.into(),
    }
}

/// OR of arbitrary sub-specs.
pub fn any_of(specs: impl IntoIterator<Item = PredicateSpec>) -> PredicateSpec {
    PredicateSpec::AnyOf(specs.into_iter().collect())
}

/// OR of scalar equalities, the common list form.
pub fn one_of<T: Into<TypedValue>>(values: impl IntoIterator<Item = T>) -> PredicateSpec {
    PredicateSpec::AnyOf(values.into_iter().map(eq).collect())
}

/// AND of arbitrary sub-specs, the comparator-map form.
pub fn all_of(specs: impl IntoIterator<Item = PredicateSpec>) -> PredicateSpec {
    PredicateSpec::AllOf(specs.into_iter().collect())
}

/// Case-sensitive regex match.
pub fn matches(pattern: impl Into<String>) -> PredicateSpec {
    PredicateSpec::Pattern {
        pattern: pattern.into(),
        case_insensitive: false,
    }
}

/// Case-insensitive regex match.
pub fn matches_ci(pattern: impl Into<String>) -> PredicateSpec {
    PredicateSpec::Pattern {
        pattern: pattern.into(),
        case_insensitive: true,
    }
}

impl From<TypedValue> for PredicateSpec {
    fn from(value: TypedValue) -> Self {
        PredicateSpec::Eq(value)
    }
}

impl From<&str> for PredicateSpec {
    fn from(value: &str) -> Self {
        eq(value)
    }
}

impl From<String> for PredicateSpec {
    fn from(value: String) -> Self {
        eq(value)
    }
}

impl From<i64> for PredicateSpec {
    fn from(value: i64) -> Self {
        eq(value)
    }
}

impl From<i32> for PredicateSpec {
    fn from(value: i32) -> Self {
        eq(value)
    }
}

impl From<f64> for PredicateSpec {
    fn from(value: f64) -> Self {
        eq(value)
    }
}

impl From<bool> for PredicateSpec {
    fn from(value: bool) -> Self {
        eq(value)
    }
}
