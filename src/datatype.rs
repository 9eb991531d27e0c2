// used for timestamps carried by entities
use chrono::{NaiveDate, NaiveDateTime, Utc};
// used for decimal numbers
use bigdecimal::BigDecimal;

// used when parsing a string to a date or timestamp
use std::str::FromStr;
// used to print out readable forms of a data type
use std::fmt;
// used to indicate that data types need to be hashable
use std::hash::Hash;
// used to overload common operations for datatypes
use std::ops;

pub trait DataType: fmt::Display + fmt::Debug + Eq + Hash + Clone + Send + Sync + 'static {
    // static stuff which needs to be implemented downstream
    const DATA_TYPE: &'static str;
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<&Self>;
    // instance callable with pre-made implementation
    fn data_type(&self) -> &'static str {
        Self::DATA_TYPE
    }
}

// ------------- Value --------------
// The scalar payload of an entity. Values are immutable, so cloning one
// is the same as copying it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    String(String),
    Decimal(Decimal),
    Time(Time),
}
impl Value {
    pub fn data_type(&self) -> &'static str {
        match self {
            Value::Boolean(_) => bool::DATA_TYPE,
            Value::Integer(_) => i64::DATA_TYPE,
            Value::String(_) => String::DATA_TYPE,
            Value::Decimal(_) => Decimal::DATA_TYPE,
            Value::Time(_) => Time::DATA_TYPE,
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "'{}'", v),
        }
    }
}

// ------------- Data Types --------------
impl DataType for bool {
    const DATA_TYPE: &'static str = "bool";
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
    fn from_value(value: &Value) -> Option<&bool> {
        match value {
            Value::Boolean(v) => Some(v),
            _ => None,
        }
    }
}
impl DataType for String {
    const DATA_TYPE: &'static str = "String";
    fn into_value(self) -> Value {
        Value::String(self)
    }
    fn from_value(value: &Value) -> Option<&String> {
        match value {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}
impl DataType for i64 {
    const DATA_TYPE: &'static str = "i64";
    fn into_value(self) -> Value {
        Value::Integer(self)
    }
    fn from_value(value: &Value) -> Option<&i64> {
        match value {
            Value::Integer(v) => Some(v),
            _ => None,
        }
    }
}
impl DataType for Decimal {
    const DATA_TYPE: &'static str = "Decimal";
    fn into_value(self) -> Value {
        Value::Decimal(self)
    }
    fn from_value(value: &Value) -> Option<&Decimal> {
        match value {
            Value::Decimal(v) => Some(v),
            _ => None,
        }
    }
}
impl DataType for Time {
    const DATA_TYPE: &'static str = "Time";
    fn into_value(self) -> Value {
        Value::Time(self)
    }
    fn from_value(value: &Value) -> Option<&Time> {
        match value {
            Value::Time(v) => Some(v),
            _ => None,
        }
    }
}

// Special types below
#[derive(Eq, PartialEq, Hash, PartialOrd, Ord, Clone, Debug)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn from_str(s: &str) -> Option<Decimal> {
        match BigDecimal::from_str(s) {
            Ok(decimal) => Some(Decimal(decimal)),
            _ => None,
        }
    }
}
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl ops::Deref for Decimal {
    type Target = BigDecimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone)]
pub enum TimeType {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}
#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone)]
pub struct Time {
    moment: TimeType,
}
impl Time {
    pub fn new() -> Time {
        Time {
            moment: TimeType::DateTime(Utc::now().naive_utc()),
        }
    }
    pub fn new_date_from(d: &str) -> Option<Time> {
        NaiveDate::from_str(d).ok().map(|date| Time {
            moment: TimeType::Date(date),
        })
    }
    pub fn new_datetime_from(d: &str) -> Option<Time> {
        NaiveDateTime::from_str(d).ok().map(|datetime| Time {
            moment: TimeType::DateTime(datetime),
        })
    }
}
impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.moment {
            TimeType::Date(d) => write!(f, "{}", d),
            TimeType::DateTime(d) => write!(f, "{}", d),
        }
    }
}
