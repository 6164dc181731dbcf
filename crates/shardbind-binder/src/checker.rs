//! Read/write-splitting rule checks

use shardbind_core::{Result, ShardbindError};
use shardbind_sql::{DistSqlStatement, ReadwriteSplittingRuleSegment};

/// Checks read/write-splitting rules against the registered storage units
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadwriteSplittingRuleChecker;

impl ReadwriteSplittingRuleChecker {
    /// Fail on the first read storage unit of `rule` that is not available
    pub fn check<S: AsRef<str>>(rule: &ReadwriteSplittingRuleSegment, available_units: &[S]) -> Result<()> {
        let missing = rule.read_storage_units.iter().find(|unit| {
            !available_units
                .iter()
                .any(|available| available.as_ref() == unit.as_str())
        });

        match missing {
            Some(unit) => Err(ShardbindError::MissingRequiredReadStorageUnit {
                rule: rule.name.clone(),
                storage_unit: unit.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Check every rule of a `CREATE READWRITE_SPLITTING RULE` statement
    ///
    /// Other statements pass unchecked.
    pub fn check_statement<S: AsRef<str>>(statement: &DistSqlStatement, available_units: &[S]) -> Result<()> {
        if let DistSqlStatement::CreateReadwriteSplittingRule { rules, .. } = statement {
            for rule in rules {
                Self::check(rule, available_units)?;
            }
        }
        Ok(())
    }
}
