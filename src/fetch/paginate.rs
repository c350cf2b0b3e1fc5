use serde_json::Value;
use tracing::{error, info};

use super::client::HttpClient;
use super::fetch_page;
use super::query::DateRange;

/// Retrieves every record for `range` by walking offset/limit pages.
///
/// The offset advances by the size of each received page, so short pages
/// from the server are handled. An empty page ends the walk. A transport
/// error also ends it, and whatever was gathered so far is returned.
#[tracing::instrument(skip(client, base_url, range), fields(range = %range))]
pub fn fetch_all<C: HttpClient + ?Sized>(
    client: &C,
    base_url: &str,
    range: &DateRange,
    limit: usize,
) -> Vec<Value> {
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        match fetch_page(client, base_url, range, limit, offset) {
            Ok(page) if page.is_empty() => {
                info!(total = all.len(), "No more data to fetch");
                break;
            }
            Ok(page) => {
                let fetched = page.len();
                offset += fetched;
                all.extend(page);
                info!(fetched, total = all.len(), "Fetched page");
            }
            Err(e) => {
                error!(
                    base_url,
                    offset,
                    total = all.len(),
                    error = %e,
                    "Error fetching data, keeping partial result"
                );
                break;
            }
        }
    }

    all
}
