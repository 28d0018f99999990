/// Number of members that form a majority of `total`.
pub(crate) fn majority_of(total: usize) -> usize {
    (total / 2) + 1
}
