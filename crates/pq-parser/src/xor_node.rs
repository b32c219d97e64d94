//! Ancestry navigation (C5 §4.4): `maybeNthPrevious` / `maybeNthNext` walk a
//! leaf-first ancestry slice by a fixed offset, optionally filtered by kind.
//! A kind mismatch is "absent", not an error — this is what lets the
//! autocomplete routines in `grammar`/`pq-inspection` read as short
//! declarative patterns instead of defensive chains of `if let`.

use pq_common::CommonError;

use crate::node_id_map::XorNode;
use crate::syntax_kind::AstNodeKind;

/// Step `n` entries *towards the leaf* (towards index 0) from `ancestry[i]`,
/// optionally requiring the reached node's kind be in `kinds`.
pub fn maybe_nth_previous<'a>(
    ancestry: &[XorNode<'a>],
    i: usize,
    n: usize,
    kinds: Option<&[AstNodeKind]>,
) -> Option<XorNode<'a>> {
    let target = i.checked_sub(n)?;
    nth_with_kind_filter(ancestry, target, kinds)
}

/// Step `n` entries *towards the root* (towards the last index) from
/// `ancestry[i]`, optionally requiring the reached node's kind be in `kinds`.
pub fn maybe_nth_next<'a>(
    ancestry: &[XorNode<'a>],
    i: usize,
    n: usize,
    kinds: Option<&[AstNodeKind]>,
) -> Option<XorNode<'a>> {
    let target = i.checked_add(n)?;
    nth_with_kind_filter(ancestry, target, kinds)
}

fn nth_with_kind_filter<'a>(
    ancestry: &[XorNode<'a>],
    target: usize,
    kinds: Option<&[AstNodeKind]>,
) -> Option<XorNode<'a>> {
    let node = *ancestry.get(target)?;
    match kinds {
        Some(allowed) if !allowed.contains(&node.kind()) => None,
        _ => Some(node),
    }
}

/// Asserting counterpart of [`maybe_nth_previous`]: an absent offset is an
/// invariant violation rather than an expected "not applicable" outcome.
pub fn assert_nth_previous<'a>(
    ancestry: &[XorNode<'a>],
    i: usize,
    n: usize,
) -> Result<XorNode<'a>, CommonError> {
    maybe_nth_previous(ancestry, i, n, None)
        .ok_or_else(|| pq_common::error::invariant_error(format!("no ancestor at {i} - {n}")))
}

/// Asserting counterpart of [`maybe_nth_next`].
pub fn assert_nth_next<'a>(
    ancestry: &[XorNode<'a>],
    i: usize,
    n: usize,
) -> Result<XorNode<'a>, CommonError> {
    maybe_nth_next(ancestry, i, n, None)
        .ok_or_else(|| pq_common::error::invariant_error(format!("no ancestor at {i} + {n}")))
}
