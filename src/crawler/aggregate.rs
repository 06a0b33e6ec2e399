use crate::crawler::types::CrawlResult;

/// Merges the settled results of one index's children
///
/// `children` must be in dispatch order. Sites are taken from every child
/// without errors and errors from every child with errors, both in that
/// order, so output ordering never depends on which child settled first.
pub fn aggregate(children: Vec<CrawlResult>) -> CrawlResult {
    let mut merged = CrawlResult::default();

    for child in children {
        if child.is_ok() {
            merged.sites.extend(child.sites);
        } else {
            merged.errors.extend(child.errors);
        }
    }

    merged
}
