//! Schema-qualified table names and their canonical text form.
//!
//! The canonical form joins segments with `.` and wraps a segment in double
//! quotes only when it contains a `.` or `"` itself, so it can always be split
//! back into the original segments.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write_segment(f, schema)?;
            f.write_str(".")?;
        }
        write_segment(f, &self.name)
    }
}

fn write_segment(f: &mut fmt::Formatter<'_>, segment: &str) -> fmt::Result {
    if segment.is_empty() || segment.contains(['.', '"']) {
        write!(f, "\"{}\"", segment.replace('"', "\"\""))
    } else {
        f.write_str(segment)
    }
}

/// Split a canonical name on dots outside double quotes.
pub(crate) fn split_qualified(canonical: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = canonical.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            '.' if !in_quotes => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);
    segments
}
