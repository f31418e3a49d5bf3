use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::{SheetMapError, SheetMapResult};

//==============================================================================
// Record Values
//==============================================================================

/// Value produced by a column accessor (and optionally rewritten by its
/// value converter) before it becomes a cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / null
    #[default]
    Empty,
    Bool(bool),
    /// Integer-family field values
    Int(i64),
    /// Decimal-family field values
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "Empty",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Number(_) => "Number",
            Value::DateTime(_) => "DateTime",
            Value::Text(_) => "Text",
        }
    }

    /// Default string form, used for text cells and for string coercion.
    pub fn render(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Number(n) => render_number(*n),
            Value::DateTime(dt) => render_datetime(dt),
            Value::Text(s) => s.clone(),
        }
    }

    /// Whether the value can be rendered through a formatter pattern.
    pub fn is_formattable(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Number(_) | Value::DateTime(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

/// Integral floats print without a trailing `.0`.
pub(crate) fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub(crate) fn render_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

//==============================================================================
// Sheet Cells
//==============================================================================

/// Typed content of one worksheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
    /// Formula text without the leading `=`, plus the last computed result if
    /// the workbook carried one.
    Formula {
        text: String,
        cached: Option<Box<CellValue>>,
    },
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn formula(text: impl Into<String>) -> Self {
        CellValue::Formula {
            text: text.into(),
            cached: None,
        }
    }

    /// Text shown for the cell: formula cells render their formula text.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => render_number(*n),
            CellValue::DateTime(dt) => render_datetime(dt),
            CellValue::Text(s) => s.clone(),
            CellValue::Formula { text, .. } => text.clone(),
            CellValue::Error(e) => e.clone(),
        }
    }
}

//==============================================================================
// Field Coercion
//==============================================================================

/// Conversion between a record field type and the tagged [`Value`].
///
/// `from_value` is the import-side coercion into the field's declared type;
/// it never sees [`Value::Empty`] for non-`Option` fields because empty
/// cells are skipped before assignment.
pub trait FieldValue: Sized {
    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> SheetMapResult<Self>;
}

impl FieldValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        Ok(value)
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        match value {
            Value::Empty => Err(SheetMapError::conversion("<empty>", "String")),
            other => Ok(other.render()),
        }
    }
}

impl FieldValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Number(n) => Ok(n != 0.0),
            Value::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(SheetMapError::conversion(s, "bool")),
            },
            other => Err(SheetMapError::conversion(other.render(), "bool")),
        }
    }
}

fn value_to_i64(value: Value, target: &'static str) -> SheetMapResult<i64> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Number(n) => {
            let rounded = n.round();
            if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64 {
                Ok(rounded as i64)
            } else {
                Err(SheetMapError::conversion(n, target))
            }
        }
        Value::Bool(b) => Ok(i64::from(b)),
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| SheetMapError::conversion(s, target)),
        other => Err(SheetMapError::conversion(other.render(), target)),
    }
}

macro_rules! impl_integer_field {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn to_value(&self) -> Value {
                    match i64::try_from(*self) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Number(*self as f64),
                    }
                }

                fn from_value(value: Value) -> SheetMapResult<Self> {
                    let i = value_to_i64(value, stringify!($ty))?;
                    <$ty>::try_from(i).map_err(|_| SheetMapError::conversion(i, stringify!($ty)))
                }
            }
        )*
    };
}

impl_integer_field!(i8, i16, i32, i64, u8, u16, u32, isize, usize);

impl FieldValue for u64 {
    fn to_value(&self) -> Value {
        match i64::try_from(*self) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Number(*self as f64),
        }
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        let i = value_to_i64(value, "u64")?;
        u64::try_from(i).map_err(|_| SheetMapError::conversion(i, "u64"))
    }
}

fn value_to_f64(value: Value, target: &'static str) -> SheetMapResult<f64> {
    match value {
        Value::Number(n) => Ok(n),
        Value::Int(i) => Ok(i as f64),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| SheetMapError::conversion(s, target)),
        other => Err(SheetMapError::conversion(other.render(), target)),
    }
}

impl FieldValue for f64 {
    fn to_value(&self) -> Value {
        Value::Number(*self)
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        value_to_f64(value, "f64")
    }
}

impl FieldValue for f32 {
    fn to_value(&self) -> Value {
        Value::Number(f64::from(*self))
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        value_to_f64(value, "f32").map(|n| n as f32)
    }
}

const DATETIME_PATTERNS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_PATTERNS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Convert an Excel serial day number (1900 date system) to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_PATTERNS
        .iter()
        .find_map(|p| NaiveDateTime::parse_from_str(s, p).ok())
        .or_else(|| {
            DATE_PATTERNS
                .iter()
                .find_map(|p| NaiveDate::parse_from_str(s, p).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

impl FieldValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Number(n) => {
                excel_serial_to_datetime(n).ok_or_else(|| SheetMapError::conversion(n, "NaiveDateTime"))
            }
            Value::Int(i) => excel_serial_to_datetime(i as f64)
                .ok_or_else(|| SheetMapError::conversion(i, "NaiveDateTime")),
            Value::Text(s) => {
                parse_datetime_text(&s).ok_or_else(|| SheetMapError::conversion(s, "NaiveDateTime"))
            }
            other => Err(SheetMapError::conversion(other.render(), "NaiveDateTime")),
        }
    }
}

impl FieldValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::DateTime(self.and_time(NaiveTime::MIN))
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        match NaiveDateTime::from_value(value) {
            Ok(dt) => Ok(dt.date()),
            Err(SheetMapError::Conversion { value, .. }) => {
                Err(SheetMapError::Conversion { value, target: "NaiveDate" })
            }
            Err(e) => Err(e),
        }
    }
}

impl<V: FieldValue> FieldValue for Option<V> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Empty,
        }
    }

    fn from_value(value: Value) -> SheetMapResult<Self> {
        match value {
            Value::Empty => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }
}
