// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Splitting of `IN (...)` lists to stay under the engine's parameter limit.

use arbor_query::Dialect;

/// Upper bound on bound parameters per statement.
pub(crate) const MAX_PARAMETERS: usize = 999;

/// Chunks of `items` that leave room for `reserved` other parameters.
pub(crate) fn chunks<T>(items: &[T], reserved: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(MAX_PARAMETERS - reserved)
}

/// `count` comma separated placeholders numbered from `first`.
pub(crate) fn placeholders(dialect: &dyn Dialect, first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| dialect.placeholder(i))
        .collect::<Vec<_>>()
        .join(", ")
}
