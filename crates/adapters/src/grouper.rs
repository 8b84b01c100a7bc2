// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contiguous-address clustering for one-round-trip batch reads.
//!
//! Callers partition points by family (function code, register prefix)
//! first; the grouper only sees one family at a time.

/// One groupable item: an index back into the caller's slice plus its
/// resolved numeric address and register span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupItem {
    pub index: usize,
    pub address: u64,
    pub span: u32,
}

impl GroupItem {
    pub fn new(index: usize, address: u64, span: u32) -> Self {
        Self {
            index,
            address,
            span: span.max(1),
        }
    }

    fn end(&self) -> u64 {
        self.address + u64::from(self.span)
    }
}

/// A contiguous run of items readable in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub start: u64,
    pub items: Vec<GroupItem>,
}

impl Group {
    /// Total registers covered by this group.
    pub fn span(&self) -> u32 {
        self.items
            .last()
            .map(|last| (last.end() - self.start) as u32)
            .unwrap_or(0)
    }
}

/// Cluster items into contiguous groups, each spanning at most `cap`
/// registers.
///
/// Items are stably sorted by address. A new group starts when the next
/// item's address leaves a gap after the current run, or when adding it
/// would push the group span past `cap`. Duplicate and overlapping
/// addresses coalesce into the running group (both readings are served
/// from the same request). Groups come out in the order they were
/// started, so the split boundary is stable under input reordering.
pub fn group_contiguous(items: &[GroupItem], cap: u32) -> Vec<Group> {
    let cap = u64::from(cap.max(1));

    let mut sorted = items.to_vec();
    sorted.sort_by_key(|item| item.address);

    let mut groups: Vec<Group> = Vec::new();
    for item in sorted {
        let fits = groups.last().is_some_and(|group| {
            let last = match group.items.last() {
                Some(last) => last,
                None => return false,
            };
            item.address <= last.end() && item.end() - group.start <= cap
        });

        if fits {
            if let Some(group) = groups.last_mut() {
                group.items.push(item);
            }
        } else {
            groups.push(Group {
                start: item.address,
                items: vec![item],
            });
        }
    }
    groups
}

#[cfg(test)]
#[path = "grouper_tests.rs"]
mod tests;
