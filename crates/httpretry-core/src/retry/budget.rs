//! Per-category retry budget.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remaining retries for one category (total, connect, read, redirect, status, other).
///
/// `Remaining` may go negative after a decrement; a negative budget is what
/// marks a policy as exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BudgetRepr", into = "BudgetRepr")]
pub enum Budget {
    /// No limit for this category; other budgets still apply.
    #[default]
    Unlimited,
    /// This many retries are left.
    Remaining(i64),
    /// Never retry this category: errors of this kind are returned as-is.
    Disabled,
}

impl Budget {
    /// Budget after one more retry has been spent.
    ///
    /// A disabled budget drops straight to `-1` so that spending it always
    /// exhausts the policy.
    pub fn decrement(self) -> Budget {
        match self {
            Budget::Unlimited => Budget::Unlimited,
            Budget::Remaining(n) => Budget::Remaining(n.saturating_sub(1)),
            Budget::Disabled => Budget::Remaining(-1),
        }
    }

    /// True when there is a non-zero count left (negative counts included).
    pub fn is_truthy(self) -> bool {
        matches!(self, Budget::Remaining(n) if n != 0)
    }

    /// True once this budget has been spent past zero.
    pub fn is_negative(self) -> bool {
        matches!(self, Budget::Remaining(n) if n < 0)
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, Budget::Unlimited)
    }

    pub fn is_disabled(self) -> bool {
        matches!(self, Budget::Disabled)
    }

    /// Remaining count, if this budget is counted.
    pub fn remaining(self) -> Option<i64> {
        match self {
            Budget::Remaining(n) => Some(n),
            Budget::Unlimited | Budget::Disabled => None,
        }
    }
}

impl From<i32> for Budget {
    fn from(n: i32) -> Self {
        Budget::Remaining(i64::from(n))
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Unlimited => write!(f, "unlimited"),
            Budget::Remaining(n) => write!(f, "{}", n),
            Budget::Disabled => write!(f, "disabled"),
        }
    }
}

/// Error parsing a budget from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBudgetError(String);

impl fmt::Display for ParseBudgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid retry budget {:?} (expected a count, \"unlimited\" or \"disabled\")",
            self.0
        )
    }
}

impl std::error::Error for ParseBudgetError {}

impl FromStr for Budget {
    type Err = ParseBudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        match t.to_ascii_lowercase().as_str() {
            "none" | "unlimited" => return Ok(Budget::Unlimited),
            "false" | "off" | "disabled" => return Ok(Budget::Disabled),
            _ => {}
        }
        t.parse::<i64>()
            .map(Budget::Remaining)
            .map_err(|_| ParseBudgetError(s.to_string()))
    }
}

/// On-disk form: `true` = unlimited, `false` = disabled, integer = remaining.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum BudgetRepr {
    Flag(bool),
    Count(i64),
}

impl TryFrom<BudgetRepr> for Budget {
    type Error = String;

    fn try_from(repr: BudgetRepr) -> Result<Self, Self::Error> {
        match repr {
            BudgetRepr::Flag(true) => Ok(Budget::Unlimited),
            BudgetRepr::Flag(false) => Ok(Budget::Disabled),
            BudgetRepr::Count(n) if n < 0 => {
                Err(format!("retry budget must not be negative (got {})", n))
            }
            BudgetRepr::Count(n) => Ok(Budget::Remaining(n)),
        }
    }
}

impl From<Budget> for BudgetRepr {
    fn from(b: Budget) -> Self {
        match b {
            Budget::Unlimited => BudgetRepr::Flag(true),
            Budget::Disabled => BudgetRepr::Flag(false),
            Budget::Remaining(n) => BudgetRepr::Count(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_rules() {
        assert_eq!(Budget::Unlimited.decrement(), Budget::Unlimited);
        assert_eq!(Budget::Remaining(2).decrement(), Budget::Remaining(1));
        assert_eq!(Budget::Remaining(0).decrement(), Budget::Remaining(-1));
        assert_eq!(Budget::Disabled.decrement(), Budget::Remaining(-1));
    }

    #[test]
    fn truthiness_matches_counts() {
        assert!(!Budget::Unlimited.is_truthy());
        assert!(!Budget::Disabled.is_truthy());
        assert!(!Budget::Remaining(0).is_truthy());
        assert!(Budget::Remaining(3).is_truthy());
        assert!(Budget::Remaining(-1).is_truthy());
    }

    #[test]
    fn only_negative_counts_are_negative() {
        assert!(Budget::Remaining(-1).is_negative());
        assert!(!Budget::Remaining(0).is_negative());
        assert!(!Budget::Unlimited.is_negative());
        assert!(!Budget::Disabled.is_negative());
    }

    #[test]
    fn kind_predicates() {
        assert!(Budget::Unlimited.is_unlimited());
        assert!(!Budget::Remaining(0).is_unlimited());
        assert!(Budget::Disabled.is_disabled());
        assert!(!Budget::Unlimited.is_disabled());
        assert_eq!(Budget::Remaining(4).remaining(), Some(4));
        assert_eq!(Budget::Disabled.remaining(), None);
    }

    #[test]
    fn parse_from_text() {
        assert_eq!("5".parse::<Budget>().unwrap(), Budget::Remaining(5));
        assert_eq!(" none ".parse::<Budget>().unwrap(), Budget::Unlimited);
        assert_eq!("Disabled".parse::<Budget>().unwrap(), Budget::Disabled);
        assert_eq!("false".parse::<Budget>().unwrap(), Budget::Disabled);
        assert!("many".parse::<Budget>().is_err());
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        b: Budget,
    }

    #[test]
    fn toml_forms() {
        let w: Wrapper = toml::from_str("b = 3").unwrap();
        assert_eq!(w.b, Budget::Remaining(3));
        let w: Wrapper = toml::from_str("b = false").unwrap();
        assert_eq!(w.b, Budget::Disabled);
        let w: Wrapper = toml::from_str("b = true").unwrap();
        assert_eq!(w.b, Budget::Unlimited);
        assert!(toml::from_str::<Wrapper>("b = -2").is_err());
    }
}
