//! Field validation for book records
//!
//! Every function here is pure. Textual input goes through a two-stage
//! parse-then-validate step and comes back as a typed value or a
//! `FieldError` naming the violated constraint.

use std::fmt;

use chrono::{Datelike, Local};

use crate::error::BookshelfError;
use crate::models::{BookId, NewBook, Price};

/// Earliest accepted publication year
pub const MIN_YEAR: i32 = 1450;
/// Highest accepted price, in cents
pub const MAX_PRICE_CENTS: i64 = 999_999;

const TITLE_MIN: usize = 2;
const TITLE_MAX: usize = 200;
const AUTHOR_MIN: usize = 2;
const AUTHOR_MAX: usize = 100;
const FILE_NAME_MAX: usize = 100;

const TITLE_PUNCTUATION: &[char] = &['-', '.', ',', ':', ';', '!', '?', '\'', '"', '(', ')'];
const AUTHOR_PUNCTUATION: &[char] = &['-', '.', '\''];
const FILE_NAME_FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Raw, untyped input for a new book as typed by the user or read from CSV
#[derive(Debug, Clone, Default)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub year: String,
    pub price: String,
}

/// A violated field constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Empty(&'static str),
    TooShort { field: &'static str, min: usize },
    TooLong { field: &'static str, max: usize, len: usize },
    InvalidCharacters(&'static str),
    NotAnInteger(&'static str),
    YearOutOfRange { year: i32, min: i32, max: i32 },
    InvalidPrice(String),
    PriceNotPositive,
    PriceTooHigh,
    IdNotPositive,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must have at least {} characters", field, min)
            }
            Self::TooLong { field, max, len } => {
                write!(f, "{} too long ({} chars, max {})", field, len, max)
            }
            Self::InvalidCharacters(field) => write!(f, "{} contains invalid characters", field),
            Self::NotAnInteger(field) => write!(f, "{} must be a whole number", field),
            Self::YearOutOfRange { year, min, max } => {
                write!(f, "year {} is outside {}..={}", year, min, max)
            }
            Self::InvalidPrice(raw) => write!(f, "price {:?} is not a valid number", raw),
            Self::PriceNotPositive => write!(f, "price must be greater than zero"),
            Self::PriceTooHigh => write!(
                f,
                "price cannot exceed {}",
                Price::from_cents(MAX_PRICE_CENTS)
            ),
            Self::IdNotPositive => write!(f, "ID must be a positive number"),
        }
    }
}

impl std::error::Error for FieldError {}

impl From<FieldError> for BookshelfError {
    fn from(err: FieldError) -> Self {
        BookshelfError::Validation(err.to_string())
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), FieldError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(FieldError::Empty(field));
    }
    if len < min {
        return Err(FieldError::TooShort { field, min });
    }
    if len > max {
        return Err(FieldError::TooLong { field, max, len });
    }
    Ok(())
}

/// Validate a title, returning it trimmed
pub fn validate_title(title: &str) -> Result<String, FieldError> {
    let title = title.trim();
    check_length("Title", title, TITLE_MIN, TITLE_MAX)?;

    let valid = title.chars().all(|c| {
        c.is_alphabetic()
            || c.is_ascii_digit()
            || c.is_whitespace()
            || TITLE_PUNCTUATION.contains(&c)
    });
    if !valid {
        return Err(FieldError::InvalidCharacters("Title"));
    }

    Ok(title.to_string())
}

/// Validate an author name, returning it trimmed
pub fn validate_author(author: &str) -> Result<String, FieldError> {
    let author = author.trim();
    check_length("Author", author, AUTHOR_MIN, AUTHOR_MAX)?;

    let valid = author
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || AUTHOR_PUNCTUATION.contains(&c));
    if !valid {
        return Err(FieldError::InvalidCharacters("Author"));
    }

    Ok(author.to_string())
}

/// Current calendar year in local time
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Check a year against `[MIN_YEAR, current_year]`
pub fn validate_year(year: i32, current_year: i32) -> Result<i32, FieldError> {
    if (MIN_YEAR..=current_year).contains(&year) {
        Ok(year)
    } else {
        Err(FieldError::YearOutOfRange {
            year,
            min: MIN_YEAR,
            max: current_year,
        })
    }
}

/// Parse and validate a publication year
pub fn parse_year(input: &str) -> Result<i32, FieldError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldError::Empty("Year"));
    }
    let year: i32 = input
        .parse()
        .map_err(|_| FieldError::NotAnInteger("Year"))?;
    validate_year(year, current_year())
}

/// Check a price against `(0, MAX_PRICE_CENTS]`
pub fn validate_price(price: Price) -> Result<Price, FieldError> {
    if price.cents() <= 0 {
        return Err(FieldError::PriceNotPositive);
    }
    if price.cents() > MAX_PRICE_CENTS {
        return Err(FieldError::PriceTooHigh);
    }
    Ok(price)
}

/// Parse and validate a price; either `.` or `,` may be the decimal separator
pub fn parse_price(input: &str) -> Result<Price, FieldError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldError::Empty("Price"));
    }
    let price = Price::parse(input).map_err(|_| FieldError::InvalidPrice(input.to_string()))?;
    validate_price(price)
}

/// Parse a book identifier
pub fn parse_id(input: &str) -> Result<BookId, FieldError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldError::Empty("ID"));
    }
    let id: i64 = input.parse().map_err(|_| FieldError::NotAnInteger("ID"))?;
    if id <= 0 {
        return Err(FieldError::IdNotPositive);
    }
    Ok(BookId::new(id))
}

/// Validate a bare file name for exports
pub fn validate_file_name(name: &str) -> Result<String, FieldError> {
    let name = name.trim();
    check_length("File name", name, 1, FILE_NAME_MAX)?;
    if name.chars().any(|c| FILE_NAME_FORBIDDEN.contains(&c)) {
        return Err(FieldError::InvalidCharacters("File name"));
    }
    Ok(name.to_string())
}

/// Validate an already typed record, returning it normalized
pub fn validate_new_book(book: &NewBook) -> Result<NewBook, FieldError> {
    Ok(NewBook {
        title: validate_title(&book.title)?,
        author: validate_author(&book.author)?,
        year: validate_year(book.year, current_year())?,
        price: validate_price(book.price)?,
    })
}

/// Parse and validate raw text input into a record
pub fn parse_book(input: &BookInput) -> Result<NewBook, FieldError> {
    Ok(NewBook {
        title: validate_title(&input.title)?,
        author: validate_author(&input.author)?,
        year: parse_year(&input.year)?,
        price: parse_price(&input.price)?,
    })
}
