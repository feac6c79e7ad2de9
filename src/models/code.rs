//! Administrative code values and their fixed-width normalization.

use std::fmt;

use thiserror::Error;

/// Width of the entity (state) code
pub const ENTITY_WIDTH: usize = 2;
/// Width of the municipality code
pub const MUNICIPALITY_WIDTH: usize = 3;
/// Width of the locality code
pub const LOCALITY_WIDTH: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("code {value:?} in {field} is not a non-negative integer")]
    InvalidCode { field: &'static str, value: String },

    #[error("code {value:?} in {field} is wider than {width} digits")]
    TooWide {
        field: &'static str,
        value: String,
        width: usize,
    },
}

/// Raw administrative code as read from a source file.
///
/// Sources disagree on representation: dBase tables usually carry codes as
/// character fields ("01"), while spreadsheets and GeoJSON often carry them
/// as numbers (1). Both normalize to the same fixed-width string.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeValue {
    Text(String),
    Number(f64),
}

impl CodeValue {
    /// Zero-pad this code to `width` digits.
    pub fn normalize(&self, field: &'static str, width: usize) -> Result<String, KeyError> {
        let digits = match self {
            CodeValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(KeyError::InvalidCode {
                        field,
                        value: s.to_string(),
                    });
                }
                s.to_string()
            }
            CodeValue::Number(n) => {
                if !n.is_finite() || *n < 0.0 || n.fract() != 0.0 {
                    return Err(KeyError::InvalidCode {
                        field,
                        value: n.to_string(),
                    });
                }
                format!("{}", *n as u64)
            }
        };

        if digits.len() > width {
            return Err(KeyError::TooWide {
                field,
                value: digits,
                width,
            });
        }

        Ok(format!("{:0>width$}", digits, width = width))
    }
}

impl From<&str> for CodeValue {
    fn from(value: &str) -> Self {
        CodeValue::Text(value.to_string())
    }
}

impl From<String> for CodeValue {
    fn from(value: String) -> Self {
        CodeValue::Text(value)
    }
}

impl From<u32> for CodeValue {
    fn from(value: u32) -> Self {
        CodeValue::Number(f64::from(value))
    }
}

impl From<i32> for CodeValue {
    fn from(value: i32) -> Self {
        CodeValue::Number(f64::from(value))
    }
}

impl fmt::Display for CodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeValue::Text(s) => write!(f, "{}", s),
            CodeValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Composite key scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLevel {
    /// entity ++ municipality (5 characters)
    Municipality,
    /// entity ++ municipality ++ locality (9 characters)
    Locality,
}

impl KeyLevel {
    /// Total width of a key at this level
    pub fn width(&self) -> usize {
        match self {
            KeyLevel::Municipality => ENTITY_WIDTH + MUNICIPALITY_WIDTH,
            KeyLevel::Locality => ENTITY_WIDTH + MUNICIPALITY_WIDTH + LOCALITY_WIDTH,
        }
    }
}
