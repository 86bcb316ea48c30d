use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{compare_names, EntityKind};
use crate::record::RawRecord;

/// Attribute names of the `solution` entity used by this crate.
pub mod attr {
    pub const SOLUTION_ID: &str = "solutionid";
    pub const DESCRIPTION: &str = "description";
    pub const FRIENDLY_NAME: &str = "friendlyname";
    pub const UNIQUE_NAME: &str = "uniquename";
    pub const VERSION: &str = "version";
    pub const INSTALLED_ON: &str = "installedon";
    pub const IS_MANAGED: &str = "ismanaged";
}

/// Columns requested when loading the inventory.
pub const SOLUTION_COLUMNS: [&str; 5] = [
    attr::DESCRIPTION,
    attr::FRIENDLY_NAME,
    attr::UNIQUE_NAME,
    attr::VERSION,
    attr::INSTALLED_ON,
];

/// Comparison operator for a filter condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equal,
    NotEqual,
}

/// `attribute <op> value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

impl Condition {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.to_string(),
            operator: ConditionOperator::Equal,
            value: value.into(),
        }
    }

    /// Evaluates the condition against a record. A missing attribute compares as `null`.
    pub fn matches(&self, record: &RawRecord) -> bool {
        let actual = record.get(&self.attribute).unwrap_or(&Value::Null);
        match self.operator {
            ConditionOperator::Equal => actual == &self.value,
            ConditionOperator::NotEqual => actual != &self.value,
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One `ORDER BY` term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub attribute: String,
    pub direction: SortDirection,
}

/// Declarative query against a remote entity set: conditions are AND-ed together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryExpression {
    pub entity: EntityKind,
    pub columns: Vec<String>,
    pub conditions: Vec<Condition>,
    pub orders: Vec<Order>,
}

impl QueryExpression {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            columns: vec![],
            conditions: vec![],
            orders: vec![],
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order(mut self, attribute: &str, direction: SortDirection) -> Self {
        self.orders.push(Order {
            attribute: attribute.to_string(),
            direction,
        });
        self
    }

    /// All unmanaged solutions, friendly name ascending.
    pub fn unmanaged_solutions() -> Self {
        Self::new(EntityKind::solution())
            .condition(Condition::equal(attr::IS_MANAGED, false))
            .columns(SOLUTION_COLUMNS)
            .order(attr::FRIENDLY_NAME, SortDirection::Ascending)
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Orders two records by this query's sort terms.
    pub fn compare(&self, a: &RawRecord, b: &RawRecord) -> Ordering {
        for order in &self.orders {
            let ord = compare_values(a.get(&order.attribute), b.get(&order.attribute));
            let ord = match order.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

// Nulls sort first and text ignores case, like the remote platform does.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => compare_names(x, y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
