use crate::error::{Error, MalformedDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

///
/// PageSpec
///
/// Validated pagination window. The external executor applies it; the core
/// only checks the decoded values are non-negative integers.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageSpec {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl PageSpec {
    #[must_use]
    pub const fn new(limit: Option<u64>, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Build from decoded request values, each optional.
    pub fn from_values(limit: Option<&Value>, offset: Option<&Value>) -> Result<Self, Error> {
        let limit = limit.map(|value| non_negative(value, "limit")).transpose()?;
        let offset = offset
            .map(|value| non_negative(value, "offset"))
            .transpose()?
            .unwrap_or(0);

        Ok(Self { limit, offset })
    }
}

fn non_negative(value: &Value, what: &'static str) -> Result<u64, MalformedDocument> {
    value
        .as_u64()
        .ok_or(MalformedDocument::NotNonNegativeInt { what })
}

///
/// TESTS
///
