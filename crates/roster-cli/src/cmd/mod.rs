pub mod absence;
pub mod grant;
pub mod history;
pub mod init;
pub mod note;
pub mod notes;
pub mod players;
pub mod record;
pub mod show;
pub mod user;

use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDate, Utc};
use roster_core::cursor::{Completion, Cursor, PageSource};
use roster_core::db;
use roster_core::error::ErrorCode;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::output::ReportedError;

/// Location of the store under a project root.
pub fn store_path(project_root: &Path) -> PathBuf {
    project_root.join(".roster/roster.db")
}

/// Open the initialized store under `project_root`.
///
/// # Errors
///
/// Returns `NotInitialized` when `roster init` has not run here, or an error
/// if the store cannot be opened.
pub fn open_existing(project_root: &Path) -> Result<Connection> {
    let path = store_path(project_root);
    db::try_open_store(&path)?.ok_or_else(|| {
        ReportedError::new(
            ErrorCode::NotInitialized,
            format!("no roster store at {}", path.display()),
        )
        .into()
    })
}

/// Parse `--at`/`--since`/`--until`: RFC 3339, or a bare date at midnight UTC.
///
/// # Errors
///
/// Returns an error when the text is neither form.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("expected RFC 3339 timestamp or YYYY-MM-DD, got '{raw}'"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .with_context(|| format!("invalid date '{raw}'"))
}

/// Optional variant of [`parse_timestamp`].
///
/// # Errors
///
/// Same as [`parse_timestamp`].
pub fn parse_optional_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}

/// Load one-based `page` of a listing through a [`Cursor`].
///
/// The first page is loaded to learn the page count, then the cursor
/// navigates to the requested page, clamped into range.
///
/// # Errors
///
/// Returns the source's error when a fetch fails.
pub fn load_page<K, S>(
    source: &mut S,
    keys: K,
    page_size: u64,
    page: i64,
) -> Result<Cursor<K, S::Item, anyhow::Error>>
where
    K: Clone + PartialEq,
    S: PageSource<K, Error = anyhow::Error>,
{
    let mut cursor = Cursor::new(page_size, keys);
    let first = cursor.reload();
    settle(&mut cursor, source, &first)?;

    if let Some(request) = cursor.go_to(page.saturating_sub(1)) {
        settle(&mut cursor, source, &request)?;
    }
    Ok(cursor)
}

fn settle<K, S>(
    cursor: &mut Cursor<K, S::Item, anyhow::Error>,
    source: &mut S,
    request: &roster_core::cursor::PageRequest<K>,
) -> Result<()>
where
    K: Clone + PartialEq,
    S: PageSource<K, Error = anyhow::Error>,
{
    match cursor.drive(source, request) {
        Completion::Applied | Completion::Stale | Completion::Shrunk => Ok(()),
        Completion::Failed => Err(cursor
            .take_error()
            .unwrap_or_else(|| anyhow::anyhow!("page {} failed to load", request.page + 1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::cursor::Page;

    struct Numbers {
        total: u64,
        calls: Vec<u64>,
    }

    impl PageSource<()> for Numbers {
        type Item = u64;
        type Error = anyhow::Error;

        fn fetch(&mut self, _keys: &(), page: u64, page_size: u64) -> Result<Page<u64>> {
            self.calls.push(page);
            let start = page * page_size;
            let end = (start + page_size).min(self.total);
            Ok(Page {
                results: (start..end).collect(),
                total_count: self.total,
            })
        }
    }

    struct Broken;

    impl PageSource<()> for Broken {
        type Item = u64;
        type Error = anyhow::Error;

        fn fetch(&mut self, _keys: &(), _page: u64, _page_size: u64) -> Result<Page<u64>> {
            anyhow::bail!("database is locked")
        }
    }

    #[test]
    fn timestamps_accept_rfc3339_and_dates() {
        let ts = parse_timestamp("2024-03-01T10:15:00Z").expect("rfc3339");
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:00+00:00");
        let midnight = parse_timestamp("2024-03-01").expect("date");
        assert_eq!(midnight.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(parse_timestamp("last tuesday").is_err());
        assert_eq!(parse_optional_timestamp(None).expect("none"), None);
    }

    #[test]
    fn load_page_navigates_from_the_first_page() {
        let mut source = Numbers {
            total: 25,
            calls: Vec::new(),
        };
        let cursor = load_page(&mut source, (), 10, 3).expect("page 3");
        assert_eq!(cursor.display_page(), 3);
        assert_eq!(cursor.visible_data(), &[20, 21, 22, 23, 24]);
        assert_eq!(source.calls, vec![0, 2]);
    }

    #[test]
    fn load_page_clamps_out_of_range_pages() {
        let mut source = Numbers {
            total: 25,
            calls: Vec::new(),
        };
        let cursor = load_page(&mut source, (), 10, 99).expect("clamped");
        assert_eq!(cursor.display_page(), 3);

        let cursor = load_page(&mut source, (), 10, -4).expect("clamped");
        assert_eq!(cursor.display_page(), 1);
        assert_eq!(cursor.total_pages(), 3);
    }

    #[test]
    fn load_page_surfaces_fetch_errors() {
        let err = load_page(&mut Broken, (), 10, 1).expect_err("fetch fails");
        assert!(err.to_string().contains("locked"));
    }
}
