use super::Backend;
use crate::error::{Error, Result};

/// Detect the backend from a database URL and return the connection target.
///
/// PostgreSQL and MySQL URLs are passed through unchanged; `sqlite://` is
/// stripped to the database file path.
pub fn parse_database_url(url: &str) -> Result<(Backend, String)> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::config("database URL is required"));
    }

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok((Backend::Postgres, url.to_string()));
    }

    if url.starts_with("mysql://") {
        return Ok((Backend::MySql, url.to_string()));
    }

    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() {
            return Err(Error::config("sqlite URL has no database path"));
        }
        return Ok((Backend::Sqlite, path.to_string()));
    }

    Err(Error::config(format!(
        "unsupported database URL scheme in '{}' (must start with postgres://, mysql://, or sqlite://)",
        redact_url(url)
    )))
}

/// Database name from the path of a server URL, e.g. `shop` in
/// `mysql://app@db:3306/shop?ssl-mode=required`
pub fn database_name_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let host_and_path = rest.rsplit_once('@').map(|(_, h)| h).unwrap_or(rest);
    let (_, path) = host_and_path.split_once('/')?;
    let name = path.trim_matches('/');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Mask the password of a server URL for display
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}
