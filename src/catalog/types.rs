//! Type normalization: backend type spellings to short canonical forms.
//!
//! Every function here is pure. Enumeration literals are resolved elsewhere
//! (one batched catalog lookup per table for PostgreSQL, the column type
//! itself for MySQL); SQLite keeps raw CHECK expressions instead.

use once_cell::sync::Lazy;
use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;

/// Map an `information_schema.columns` type to a canonical PostgreSQL spelling.
///
/// `udt_name` is the physical type name (`_int4` for `integer[]`, the enum's
/// own name for user-defined types) and `char_max_length` the declared length
/// of character types.
pub fn normalize_postgres_type(
    data_type: &str,
    udt_name: &str,
    char_max_length: Option<i64>,
) -> String {
    match data_type {
        "timestamp with time zone" => "timestamptz".to_string(),
        "timestamp without time zone" => "timestamp".to_string(),
        "time with time zone" => "timetz".to_string(),
        "time without time zone" => "time".to_string(),
        "character varying" => match char_max_length {
            Some(n) => format!("varchar({})", n),
            None => "varchar".to_string(),
        },
        "character" => match char_max_length {
            Some(n) => format!("char({})", n),
            None => "char".to_string(),
        },
        "ARRAY" => match udt_name.strip_prefix('_') {
            Some(element) if !element.is_empty() => {
                format!("{}[]", normalize_udt_name(element))
            }
            _ => "array".to_string(),
        },
        "USER-DEFINED" => udt_name.to_string(),
        other => other.to_string(),
    }
}

/// Readable name for a PostgreSQL internal type name (`int4` -> `integer`)
pub fn normalize_udt_name(udt_name: &str) -> &str {
    match udt_name {
        "int2" => "smallint",
        "int4" => "integer",
        "int8" => "bigint",
        "float4" => "real",
        "float8" => "double precision",
        "bool" => "boolean",
        "bpchar" => "char",
        other => other,
    }
}

/// Literal list of a MySQL `enum(...)` or `set(...)` column type.
///
/// Returns the canonical type (`enum` or `set`) and the literals in declared
/// order, or `None` for any other column type. Doubled quotes and backslash
/// escapes inside literals are unescaped; commas inside literals are kept.
pub fn parse_mysql_enum(column_type: &str) -> Option<(&'static str, Vec<String>)> {
    let trimmed = column_type.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (kind, rest) = if lower.starts_with("enum(") {
        ("enum", &trimmed[5..])
    } else if lower.starts_with("set(") {
        ("set", &trimmed[4..])
    } else {
        return None;
    };
    let body = rest.strip_suffix(')')?;
    Some((kind, parse_quoted_list(body)))
}

fn parse_quoted_list(body: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            // Unquoted item: read up to the next comma
            let mut value = String::from(quote);
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            values.push(value.trim().to_string());
            continue;
        }

        let mut value = String::new();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    value.push(escaped);
                }
            } else if c == quote {
                if chars.peek() == Some(&quote) {
                    chars.next();
                    value.push(quote);
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }
        values.push(value);
    }

    values
}

/// Canonical spelling of a SQLite declared type.
///
/// Declared types are free text in SQLite; they are lowercased with runs of
/// whitespace collapsed. A column without a declared type has BLOB affinity.
pub fn normalize_sqlite_type(declared: &str) -> String {
    let collapsed = declared.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "blob".to_string()
    } else {
        collapsed.to_lowercase()
    }
}

/// Start of a CHECK constraint, up to and including its opening paren
static CHECK_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcheck\s*\(").unwrap());

/// Quoted (`"x"`, `` `x` ``, `[x]`) or bare identifier
static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"|`([^`]+)`|\[([^\]]+)\]|([A-Za-z_][A-Za-z0-9_$]*)"#).unwrap()
});

/// Every `CHECK (...)` expression in a `CREATE TABLE` statement, in order.
///
/// String literals, quoted identifiers and comments are skipped, so a default
/// such as `'check (x)'` or a commented-out constraint is not mistaken for a
/// live one. The returned text excludes the outer parens.
pub fn check_constraints(create_sql: &str) -> Vec<String> {
    let masked = mask_sql(create_sql, true);
    let mut checks = Vec::new();

    for m in CHECK_KEYWORD_RE.find_iter(&masked) {
        let open = m.end() - 1;
        if let Some(close) = matching_paren(&masked, open) {
            let expr = create_sql[open + 1..close].trim();
            if !expr.is_empty() {
                checks.push(expr.to_string());
            }
        }
    }

    checks
}

/// The single column (from `columns`) an expression mentions, if exactly one.
pub fn check_subject<'a>(expr: &str, columns: &'a [String]) -> Option<&'a str> {
    let masked = mask_sql(expr, false);
    let mut subject: Option<&'a str> = None;

    for caps in IDENTIFIER_RE.captures_iter(&masked) {
        let Some(ident) = (1..=4).find_map(|i| caps.get(i)) else {
            continue;
        };
        let ident = ident.as_str();
        let Some(column) = columns.iter().find(|c| c.eq_ignore_ascii_case(ident)) else {
            continue;
        };
        match subject {
            None => subject = Some(column.as_str()),
            Some(seen) if seen == column.as_str() => {}
            Some(_) => return None,
        }
    }

    subject
}

/// Blank out comments and the contents of quoted text, keeping byte offsets.
///
/// Single-quoted literals are always masked. With `identifiers`, the contents
/// of `"x"`, `` `x` `` and `[x]` identifiers are masked too. Quote characters
/// themselves are kept; comments become spaces.
fn mask_sql(sql: &str, identifiers: bool) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                out.push(c);
                mask_quoted(&mut chars, &mut out, '\'');
            }
            '"' | '`' if identifiers => {
                out.push(c);
                mask_quoted(&mut chars, &mut out, c);
            }
            '[' if identifiers => {
                out.push(c);
                mask_quoted(&mut chars, &mut out, ']');
            }
            '-' if chars.peek() == Some(&'-') => {
                out.push(' ');
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    blank(&mut out, next);
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                let mut prev = '\0';
                for next in chars.by_ref() {
                    blank(&mut out, next);
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            c => out.push(c),
        }
    }

    out
}

/// Mask up to and including the closing `quote`; a doubled quote is an escape
fn mask_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        if c == quote {
            if chars.peek() == Some(&quote) {
                chars.next();
                out.push_str("  ");
                continue;
            }
            out.push(c);
            return;
        }
        blank(out, c);
    }
}

fn blank(out: &mut String, c: char) {
    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
}

/// Byte index of the paren closing the one at `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
