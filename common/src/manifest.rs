//! Manifest types. [Record] is a single line of `manifest.afcache`, [Manifest]
//! is the whole file.

use crate::{MANIFEST_FIELD_SEPARATOR, http_date};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};

/// Error returned when parsing manifest text fails.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not consist of 3 or 4 fields.
    #[error("line {line}: expected 3 or 4 fields, got {fields}")]
    FieldCount {
        /// 1-based line number, 0 when parsing a standalone record.
        line: usize,
        /// Number of fields found.
        fields: usize,
    },
    /// One of timestamp fields could not be parsed.
    #[error("line {line}: invalid date {value:?}")]
    Date {
        /// 1-based line number, 0 when parsing a standalone record.
        line: usize,
        /// Offending field value.
        value: String,
    },
    /// Url or mime type field is empty.
    #[error("line {line}: empty field")]
    EmptyField {
        /// 1-based line number, 0 when parsing a standalone record.
        line: usize,
    },
}
impl ParseError {
    fn at_line(
        self,
        line: usize,
    ) -> Self {
        match self {
            Self::FieldCount { fields, .. } => Self::FieldCount { line, fields },
            Self::Date { value, .. } => Self::Date { line, value },
            Self::EmptyField { .. } => Self::EmptyField { line },
        }
    }
}

/// Single manifest line, describing one packaged file.
///
/// Rendered (with [fmt::Display]) as `<url> ; <last modified> ; <expires>`,
/// with ` ; <mime type>` appended if [Self::mime_type] is set.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Record {
    /// Url the file represents, eg. `http://example.com/css/style.css`.
    pub url: String,
    /// `Last-Modified` of the resource.
    pub last_modified: DateTime<Utc>,
    /// `Expires` of the resource.
    pub expires: DateTime<Utc>,
    /// `Content-Type` of the resource, if known.
    pub mime_type: Option<String>,
}
impl fmt::Display for Record {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.url,
            http_date::format(&self.last_modified),
            http_date::format(&self.expires),
            sep = MANIFEST_FIELD_SEPARATOR,
        )?;
        if let Some(mime_type) = &self.mime_type {
            write!(f, "{MANIFEST_FIELD_SEPARATOR}{mime_type}")?;
        }
        Ok(())
    }
}
impl FromStr for Record {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields = line.split(MANIFEST_FIELD_SEPARATOR).collect::<Vec<_>>();

        let (url, last_modified, expires, mime_type) = match fields.as_slice() {
            [url, last_modified, expires] => (*url, *last_modified, *expires, None),
            [url, last_modified, expires, mime_type] => {
                (*url, *last_modified, *expires, Some(*mime_type))
            }
            _ => {
                return Err(ParseError::FieldCount {
                    line: 0,
                    fields: fields.len(),
                });
            }
        };

        if url.is_empty() || mime_type.is_some_and(str::is_empty) {
            return Err(ParseError::EmptyField { line: 0 });
        }

        let parse_date = |value: &str| {
            http_date::parse(value).map_err(|_| ParseError::Date {
                line: 0,
                value: value.to_owned(),
            })
        };

        Ok(Self {
            url: url.to_owned(),
            last_modified: parse_date(last_modified)?,
            expires: parse_date(expires)?,
            mime_type: mime_type.map(str::to_owned),
        })
    }
}

/// Whole `manifest.afcache` content, list of [Record] in archive order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Manifest {
    /// Records, one per packaged file.
    pub records: Vec<Record>,
}
impl Manifest {
    /// Renders manifest text: records joined with `\n`, no header and no
    /// trailing newline.
    pub fn render(&self) -> String {
        itertools::join(&self.records, "\n")
    }

    /// Parses manifest text. Empty text yields empty manifest.
    ///
    /// # Examples
    ///
    /// ```
    /// # use afcache_pack_common::manifest::Manifest;
    /// let manifest = Manifest::parse(
    ///     "http://example.com/a.txt ; Wed, 01 Jan 2020 00:00:00 GMT+00:00 ; Wed, 01 Jan 2020 01:00:00 GMT+00:00",
    /// )
    /// .unwrap();
    /// assert_eq!(manifest.records.len(), 1);
    /// assert_eq!(manifest.records[0].url, "http://example.com/a.txt");
    /// assert!(manifest.records[0].mime_type.is_none());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text.is_empty() {
            return Ok(Self::default());
        }

        let records = text
            .split('\n')
            .enumerate()
            .map(|(index, line)| {
                line.parse::<Record>()
                    .map_err(|error| error.at_line(index + 1))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }
}
