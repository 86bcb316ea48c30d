//! Raw remote record -> [`Solution`].

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::MappingError;
use crate::model::{EntityKind, Solution, SolutionId};
use crate::query::attr;
use crate::record::RawRecord;

/// Converts raw `solution` records into [`Solution`] values.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolutionRecordMapper;

impl SolutionRecordMapper {
    /// Maps one record. Required: `solutionid` (GUID), `uniquename`, `friendlyname`.
    /// `description` and `installedon` become `None` when absent.
    pub fn map(&self, raw: &RawRecord) -> Result<Solution, MappingError> {
        let id = required_str(raw, attr::SOLUTION_ID)?;
        let solution_id = id
            .parse::<SolutionId>()
            .map_err(|_| MappingError::WrongShape {
                field: attr::SOLUTION_ID,
                expected: "guid",
                found: format!("{id:?}"),
            })?;

        Ok(Solution {
            entity_kind: EntityKind::solution(),
            solution_id,
            friendly_name: required_str(raw, attr::FRIENDLY_NAME)?.to_string(),
            unique_name: required_str(raw, attr::UNIQUE_NAME)?.to_string(),
            // Always populated by the platform; an absent value is shown as blank.
            version: optional_str(raw, attr::VERSION)?.unwrap_or_default().to_string(),
            description: optional_str(raw, attr::DESCRIPTION)?.map(str::to_string),
            installed_on: optional_timestamp(raw, attr::INSTALLED_ON)?,
        })
    }

    /// Maps a whole batch, failing on the first malformed record.
    pub fn map_all(&self, raws: &[RawRecord]) -> Result<Vec<Solution>, (usize, MappingError)> {
        raws.iter()
            .enumerate()
            .map(|(i, raw)| self.map(raw).map_err(|e| (i, e)))
            .collect()
    }
}

fn required_str<'a>(raw: &'a RawRecord, field: &'static str) -> Result<&'a str, MappingError> {
    optional_str(raw, field)?.ok_or(MappingError::MissingField { field })
}

fn optional_str<'a>(
    raw: &'a RawRecord,
    field: &'static str,
) -> Result<Option<&'a str>, MappingError> {
    match raw.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(wrong_shape(field, "string", other)),
    }
}

fn optional_timestamp(
    raw: &RawRecord,
    field: &'static str,
) -> Result<Option<OffsetDateTime>, MappingError> {
    let Some(s) = optional_str(raw, field)? else {
        return Ok(None);
    };
    OffsetDateTime::parse(s, &Rfc3339)
        .map(Some)
        .map_err(|_| MappingError::WrongShape {
            field,
            expected: "rfc3339 timestamp",
            found: format!("{s:?}"),
        })
}

fn wrong_shape(field: &'static str, expected: &'static str, found: &Value) -> MappingError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    MappingError::WrongShape {
        field,
        expected,
        found: found.to_string(),
    }
}
