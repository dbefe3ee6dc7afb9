use crate::grid::{CellGrid, ParentMap};

/// Follow parent links from `to` back to `from` and return the chain in
/// `from -> to` order.
///
/// Returns `None` when a link is missing or the chain is longer than the
/// grid, which can only happen if the parent map is inconsistent.
pub(crate) fn walk_parents(
    grid: &CellGrid,
    parents: &ParentMap,
    from: usize,
    to: usize,
) -> Option<Vec<usize>> {
    let mut chain = vec![to];
    let mut cur = to;
    while cur != from {
        let dir = parents.get(cur)?;
        cur = grid.neighbor_at(cur, dir)?;
        chain.push(cur);
        if chain.len() > grid.len() {
            return None;
        }
    }
    chain.reverse();
    Some(chain)
}
