//! Request model for the rowguard query compiler.
//!
//! Everything in this crate is wire-facing and database-agnostic: the
//! declarative filter/order/pagination shapes a caller submits, the scalar
//! literal type that later becomes a bound statement parameter, and the
//! unified [`Rejection`] taxonomy. Compilation to SQL lives in `rowguard-db`;
//! this crate never produces SQL text.

pub mod limits;
pub mod rejection;

pub use limits::PageLimits;
pub use rejection::{Rejection, WriteOp};

pub mod value {
    use bigdecimal::BigDecimal;

    /// A literal value supplied by a caller and later bound as a statement
    /// parameter. Literals never reach SQL text in any other form.
    #[derive(Clone, Debug, PartialEq)]
    pub enum ScalarValue {
        Null,
        Bool(bool),
        Number(BigDecimal),
        String(String),
    }

    impl ScalarValue {
        #[must_use]
        pub fn is_null(&self) -> bool {
            matches!(self, ScalarValue::Null)
        }

        /// True for the literal types predicates may bind (string/number).
        #[must_use]
        pub fn is_ordinal(&self) -> bool {
            matches!(self, ScalarValue::Number(_) | ScalarValue::String(_))
        }
    }

    impl std::fmt::Display for ScalarValue {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                ScalarValue::Null => write!(f, "null"),
                ScalarValue::Bool(_) => write!(f, "bool"),
                ScalarValue::Number(_) => write!(f, "number"),
                ScalarValue::String(_) => write!(f, "string"),
            }
        }
    }

    impl From<&str> for ScalarValue {
        fn from(s: &str) -> Self {
            ScalarValue::String(s.to_owned())
        }
    }

    impl From<String> for ScalarValue {
        fn from(s: String) -> Self {
            ScalarValue::String(s)
        }
    }

    impl From<i64> for ScalarValue {
        fn from(n: i64) -> Self {
            ScalarValue::Number(BigDecimal::from(n))
        }
    }

    impl From<u64> for ScalarValue {
        fn from(n: u64) -> Self {
            ScalarValue::Number(BigDecimal::from(n))
        }
    }

    impl From<bool> for ScalarValue {
        fn from(b: bool) -> Self {
            ScalarValue::Bool(b)
        }
    }

    fn scalar_from_json(v: serde_json::Value) -> Result<ScalarValue, String> {
        match v {
            serde_json::Value::Null => Ok(ScalarValue::Null),
            serde_json::Value::Bool(b) => Ok(ScalarValue::Bool(b)),
            // Precision-preserving: go through the textual form rather than f64.
            serde_json::Value::Number(n) => n
                .to_string()
                .parse::<BigDecimal>()
                .map(ScalarValue::Number)
                .map_err(|_| format!("unrepresentable number: {n}")),
            serde_json::Value::String(s) => Ok(ScalarValue::String(s)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err("expected a scalar literal".to_owned())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for ScalarValue {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let v = serde_json::Value::deserialize(deserializer)?;
            scalar_from_json(v).map_err(serde::de::Error::custom)
        }
    }

    /// A filter literal: a single scalar, or a list for the two-element
    /// membership/range operators.
    #[derive(Clone, Debug, PartialEq)]
    pub enum FilterValue {
        Scalar(ScalarValue),
        List(Vec<ScalarValue>),
    }

    impl FilterValue {
        #[must_use]
        pub fn as_scalar(&self) -> Option<&ScalarValue> {
            match self {
                FilterValue::Scalar(v) => Some(v),
                FilterValue::List(_) => None,
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for FilterValue {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let v = serde_json::Value::deserialize(deserializer)?;
            match v {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .map(|i| scalar_from_json(i).map_err(serde::de::Error::custom))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FilterValue::List),
                other => scalar_from_json(other)
                    .map(FilterValue::Scalar)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

pub use value::{FilterValue, ScalarValue};

/// The closed operator set the predicate compiler accepts. Extending it is a
/// code change, never configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
}

impl FilterOp {
    /// Resolve a wire token (`eq`, `gte`, `is_null`, …), case-insensitively.
    ///
    /// # Errors
    /// Returns [`Rejection::UnknownOperator`] for any token outside the set.
    pub fn parse(token: &str) -> Result<Self, Rejection> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Ok(FilterOp::Eq),
            "ne" => Ok(FilterOp::Ne),
            "gt" => Ok(FilterOp::Gt),
            "lt" => Ok(FilterOp::Lt),
            "gte" => Ok(FilterOp::Ge),
            "lte" => Ok(FilterOp::Le),
            "like" => Ok(FilterOp::Like),
            "in" => Ok(FilterOp::In),
            "between" => Ok(FilterOp::Between),
            "is_null" => Ok(FilterOp::IsNull),
            "is_not_null" => Ok(FilterOp::IsNotNull),
            _ => Err(Rejection::UnknownOperator(token.to_owned())),
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Lt => "lt",
            FilterOp::Ge => "gte",
            FilterOp::Le => "lte",
            FilterOp::Like => "like",
            FilterOp::In => "in",
            FilterOp::Between => "between",
            FilterOp::IsNull => "is_null",
            FilterOp::IsNotNull => "is_not_null",
        };
        write!(f, "{s}")
    }
}

/// Sort direction for an order entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    /// Resolve a wire token, case-insensitively. Anything other than
    /// asc/desc is not a direction.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDir::Asc),
            "desc" => Some(SortDir::Desc),
            _ => None,
        }
    }
}

/// One caller-supplied filter entry. The operator stays a raw token here so
/// that unknown spellings can be classified (and dropped) by the predicate
/// compiler instead of failing deserialization of the whole request.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct FilterSpec {
    pub column: String,
    #[serde(alias = "op")]
    pub operator: String,
    #[serde(default)]
    pub value: Option<FilterValue>,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<ScalarValue>) -> Self {
        self.value = Some(FilterValue::Scalar(value.into()));
        self
    }

    #[must_use]
    pub fn with_values<V: Into<ScalarValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.value = Some(FilterValue::List(
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// One caller-supplied order entry; the direction stays a raw token for the
/// same reason as [`FilterSpec::operator`].
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct OrderSpec {
    pub column: String,
    pub direction: String,
}

impl OrderSpec {
    pub fn new(column: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: direction.into(),
        }
    }
}

/// Declarative read request: filters, orders, pagination.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct ReadRequest {
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub orders: Vec<OrderSpec>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl ReadRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.orders.push(order);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Column/value map for write payloads. Ordered so that identical payloads
/// always compile to byte-identical SQL.
pub type ColumnValues = std::collections::BTreeMap<String, ScalarValue>;

/// Update: a full primary-key map plus the columns to change.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub key: ColumnValues,
    #[serde(default, alias = "updateValues")]
    pub values: ColumnValues,
}

/// Delete: a full primary-key map.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub key: ColumnValues,
}

/// Insert: the new row's column/value map.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct InsertRequest {
    #[serde(default, alias = "insertValues")]
    pub values: ColumnValues,
}
