// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The marker event log.
//!
//! Rules never build tree nodes directly. They append events here and
//! the tree builder turns the finished log into a [`Node`](super::Node)
//! in one pass. Backtracking is then just truncating the log.

/// What happened to an opened marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerState<N> {
    /// Opened and not yet closed. Seeing this in the builder means a
    /// rule leaked a marker.
    Pending,
    /// Closed as a node of this kind.
    Done(N),
    /// Closed at the root, merging with a single same-span child.
    Collapsed(N),
    /// Discarded; its children belong to the parent.
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event<N> {
    /// A marker was opened here. The state is patched in place when the
    /// marker is closed or dropped.
    Open(MarkerState<N>),
    /// The innermost node started by an `Open` ends here.
    Close,
    /// The next token of the stream is consumed into the current node.
    Token,
}
