use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::QueryError;

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self, QueryError> {
        let schema = schema.into();
        let table = table.into();
        validate_identifier(&schema)?;
        validate_identifier(&table)?;
        Ok(Self { schema, table })
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

pub fn validate_identifier(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    Neq,
    In,
    Like,
    NotLike,
    IsNull,
    NotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op: FilterOp::Eq, value: value.into() }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { column: column.into(), op: FilterOp::Neq, value: value.into() }
    }

    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::In,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    /// `*` is the PostgREST wildcard
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self { column: column.into(), op: FilterOp::Like, value: Value::String(pattern.into()) }
    }

    pub fn not_like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self { column: column.into(), op: FilterOp::NotLike, value: Value::String(pattern.into()) }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self { column: column.into(), op: FilterOp::IsNull, value: Value::Null }
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self { column: column.into(), op: FilterOp::NotNull, value: Value::Null }
    }

    /// Render as a `(column, "op.value")` query pair
    pub fn to_param(&self) -> Result<(String, String), QueryError> {
        validate_identifier(&self.column)?;
        let rendered = match self.op {
            FilterOp::Eq => format!("eq.{}", self.scalar()?),
            FilterOp::Neq => format!("neq.{}", self.scalar()?),
            FilterOp::Like => format!("like.{}", self.scalar()?),
            FilterOp::NotLike => format!("not.like.{}", self.scalar()?),
            FilterOp::IsNull => "is.null".to_string(),
            FilterOp::NotNull => "not.is.null".to_string(),
            FilterOp::In => {
                let items = self.value.as_array().ok_or_else(|| QueryError::InvalidValue {
                    column: self.column.clone(),
                    reason: "in requires an array".to_string(),
                })?;
                let parts = items
                    .iter()
                    .map(|v| scalar_text(&self.column, v).map(|s| quote_list_item(&s)))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("in.({})", parts.join(","))
            }
        };
        Ok((self.column.clone(), rendered))
    }

    fn scalar(&self) -> Result<String, QueryError> {
        scalar_text(&self.column, &self.value)
    }
}

fn scalar_text(column: &str, value: &Value) -> Result<String, QueryError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(QueryError::InvalidValue {
            column: column.to_string(),
            reason: format!("unsupported value {}", value),
        }),
    }
}

// PostgREST reserves , . : ( ) and " inside list values
fn quote_list_item(item: &str) -> String {
    if item.chars().any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | ' ')) {
        format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        item.to_string()
    }
}

/// Rows an update or delete applies to
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// Every row of the table, stated explicitly
    All,
    Matching(Vec<Condition>),
}

impl Scope {
    pub fn matching(condition: Condition) -> Self {
        Scope::Matching(vec![condition])
    }

    pub fn to_params(&self, action: &'static str) -> Result<Vec<(String, String)>, QueryError> {
        match self {
            Scope::All => Ok(vec![("id".to_string(), "not.is.null".to_string())]),
            Scope::Matching(conditions) if conditions.is_empty() => Err(QueryError::EmptyScope(action)),
            Scope::Matching(conditions) => conditions.iter().map(Condition::to_param).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub sort: SortDirection,
}

impl OrderBy {
    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), sort: SortDirection::Desc }
    }
}

/// Projected column, optionally a foreign-key embed
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Plain(String),
    Embed {
        relation: String,
        hint: Option<String>,
        columns: Vec<Column>,
    },
}

impl Column {
    pub fn render(&self) -> Result<String, QueryError> {
        match self {
            Column::Plain(name) if name == "*" => Ok("*".to_string()),
            Column::Plain(name) => {
                validate_identifier(name)?;
                Ok(name.clone())
            }
            Column::Embed { relation, hint, columns } => {
                validate_identifier(relation)?;
                let head = match hint {
                    Some(h) => {
                        validate_identifier(h)?;
                        format!("{}!{}", relation, h)
                    }
                    None => relation.clone(),
                };
                Ok(format!("{}({})", head, render_columns(columns)?))
            }
        }
    }
}

fn render_columns(columns: &[Column]) -> Result<String, QueryError> {
    if columns.is_empty() {
        return Ok("*".to_string());
    }
    Ok(columns.iter().map(Column::render).collect::<Result<Vec<_>, _>>()?.join(","))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub columns: Vec<Column>,
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderBy>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, names: &[&str]) -> Self {
        self.columns.extend(names.iter().map(|n| Column::Plain(n.to_string())));
        self
    }

    pub fn embed(mut self, relation: &str, hint: Option<&str>, names: &[&str]) -> Self {
        self.columns.push(Column::Embed {
            relation: relation.to_string(),
            hint: hint.map(str::to_string),
            columns: names.iter().map(|n| Column::Plain(n.to_string())).collect(),
        });
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn select_clause(&self) -> Result<String, QueryError> {
        render_columns(&self.columns)
    }

    pub fn to_params(&self) -> Result<Vec<(String, String)>, QueryError> {
        let mut params = vec![("select".to_string(), self.select_clause()?)];
        for condition in &self.conditions {
            params.push(condition.to_param()?);
        }
        if !self.order.is_empty() {
            let parts = self
                .order
                .iter()
                .map(|o| {
                    validate_identifier(&o.column)?;
                    Ok(format!("{}.{}", o.column, o.sort.as_str()))
                })
                .collect::<Result<Vec<_>, QueryError>>()?;
            params.push(("order".to_string(), parts.join(",")));
        }
        Ok(params)
    }
}
