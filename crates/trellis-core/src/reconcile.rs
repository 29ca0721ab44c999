use crate::element::Element;
use crate::error::ReconcileError;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};

/// Diffs `elements` against the previous children of `parent` (reached via
/// its alternate) and links the resulting fibers under `parent`.
///
/// Matching is positional: the i-th element is compared with the i-th old
/// child and reused only when both have the same type. Old fibers left
/// without a match are tagged [`EffectTag::Deletion`] and pushed onto
/// `deletions`; they are not part of the new sibling chain. Reordered lists
/// therefore show up as deletions plus placements, never as moves.
pub(crate) fn reconcile_children<N: Clone>(
    tree: &mut FiberTree<N>,
    deletions: &mut Vec<FiberId>,
    parent: FiberId,
    elements: Vec<Element>,
) -> Result<(), ReconcileError> {
    let alternate = tree.fiber(parent)?.alternate;
    let mut old = alternate.and_then(|id| tree.get(id)).and_then(|fiber| fiber.child);
    let mut elements = elements.into_iter();
    let mut first: Option<FiberId> = None;
    let mut previous: Option<FiberId> = None;

    loop {
        let element = elements.next();
        let old_fiber = old;
        if element.is_none() && old_fiber.is_none() {
            break;
        }
        if let Some(old_id) = old_fiber {
            old = tree.fiber(old_id)?.sibling;
        }

        let same_type = match (&element, old_fiber) {
            (Some(element), Some(old_id)) => {
                tree.fiber(old_id)?.element_type() == element.element_type()
            }
            _ => false,
        };

        let new_fiber = match element {
            Some(element) if same_type => {
                let old_id = old_fiber.ok_or(ReconcileError::MissingFiber(parent))?;
                let host = tree.fiber(old_id)?.host.clone();
                let mut fiber = Fiber::new(element, Some(parent));
                fiber.host = host;
                fiber.alternate = Some(old_id);
                fiber.effect = Some(EffectTag::Update);
                Some(tree.insert(fiber))
            }
            Some(element) => {
                let mut fiber = Fiber::new(element, Some(parent));
                fiber.effect = Some(EffectTag::Placement);
                Some(tree.insert(fiber))
            }
            None => None,
        };

        if let (Some(old_id), false) = (old_fiber, same_type) {
            tree.fiber_mut(old_id)?.effect = Some(EffectTag::Deletion);
            deletions.push(old_id);
        }

        if let Some(id) = new_fiber {
            match previous {
                Some(prev) => tree.fiber_mut(prev)?.sibling = Some(id),
                None => first = Some(id),
            }
            previous = Some(id);
        }
    }

    tree.fiber_mut(parent)?.child = first;
    Ok(())
}
