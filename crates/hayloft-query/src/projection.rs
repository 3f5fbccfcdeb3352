//! Column projection entries and their descriptor compilation.

use hayloft_codec::ColumnKey;
use hayloft_store::{ColumnSelector, QualifierRange, QualifierWindow, ScanDescriptor};
use serde::{Deserialize, Serialize};

use crate::compile::FilterError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionSpec {
    /// One exact column.
    Column(ColumnKey),
    /// Every qualifier in a family.
    Family(String),
    /// Byte-range of qualifiers within one family.
    QualifierRange {
        family: String,
        start: Option<Vec<u8>>,
        stop: Option<Vec<u8>>,
        stop_inclusive: bool,
    },
    /// Offset/limit window over each row's qualifiers; exclusive with
    /// plain column/family projection.
    Window { offset: usize, limit: usize },
}

impl ProjectionSpec {
    pub fn column(key: impl Into<ColumnKey>) -> Self {
        ProjectionSpec::Column(key.into())
    }

    pub fn family(name: impl Into<String>) -> Self {
        ProjectionSpec::Family(name.into())
    }

    pub fn qualifier_range(
        family: impl Into<String>,
        start: Option<Vec<u8>>,
        stop: Option<Vec<u8>>,
        stop_inclusive: bool,
    ) -> Self {
        ProjectionSpec::QualifierRange {
            family: family.into(),
            start,
            stop,
            stop_inclusive,
        }
    }

    pub fn window(offset: usize, limit: usize) -> Self {
        ProjectionSpec::Window { offset, limit }
    }
}

/// `"family:qualifier"` projects one column; a bare `"family"` projects
/// the whole family.
impl From<&str> for ProjectionSpec {
    fn from(spec: &str) -> Self {
        if spec.contains(':') {
            ProjectionSpec::Column(ColumnKey::parse(spec))
        } else {
            ProjectionSpec::Family(spec.to_string())
        }
    }
}

impl From<ColumnKey> for ProjectionSpec {
    fn from(key: ColumnKey) -> Self {
        ProjectionSpec::Column(key)
    }
}

/// Validate projection entries and write them into the descriptor.
pub fn compile_projection(
    specs: &[ProjectionSpec],
    descriptor: &mut ScanDescriptor,
) -> Result<(), FilterError> {
    for spec in specs {
        match spec {
            ProjectionSpec::Column(key) => {
                if key.family().is_empty() {
                    return Err(FilterError(format!(
                        "projected column {key:?} has an empty family"
                    )));
                }
                descriptor
                    .columns
                    .push(ColumnSelector::Column(key.clone()));
            }
            ProjectionSpec::Family(name) => {
                if name.is_empty() {
                    return Err(FilterError("projected family name is empty".to_string()));
                }
                descriptor
                    .columns
                    .push(ColumnSelector::Family(name.clone()));
            }
            ProjectionSpec::QualifierRange {
                family,
                start,
                stop,
                stop_inclusive,
            } => {
                if descriptor.qualifier_range.is_some() {
                    return Err(FilterError(
                        "only one qualifier range projection is allowed".to_string(),
                    ));
                }
                descriptor.qualifier_range = Some(QualifierRange {
                    family: family.clone(),
                    start: start.clone(),
                    stop: stop.clone(),
                    stop_inclusive: *stop_inclusive,
                });
            }
            ProjectionSpec::Window { offset, limit } => {
                if descriptor.window.is_some() {
                    return Err(FilterError(
                        "only one offset/limit projection is allowed".to_string(),
                    ));
                }
                descriptor.window = Some(QualifierWindow {
                    offset: *offset,
                    limit: *limit,
                });
            }
        }
    }
    if descriptor.window.is_some() && !descriptor.columns.is_empty() {
        return Err(FilterError(
            "offset/limit projection cannot be combined with column or family projection"
                .to_string(),
        ));
    }
    Ok(())
}
