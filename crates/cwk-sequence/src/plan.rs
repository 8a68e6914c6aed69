use crate::Sequenced;

/// One sibling's new order value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Renumber<Id> {
    pub id: Id,
    pub order: i32,
}

/// Result of planning an insert: the order the new record gets, and the
/// siblings that have to move down to make room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertPlan<Id> {
    pub order: i32,
    pub shifts: Vec<Renumber<Id>>,
}

/// Result of planning a move. `shifts` never contains the moved record itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePlan<Id> {
    pub id: Id,
    pub from: i32,
    pub to: i32,
    pub shifts: Vec<Renumber<Id>>,
}

impl<Id> MovePlan<Id> {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Result of planning a removal: the siblings that close the gap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovePlan<Id> {
    pub id: Id,
    pub removed_order: i32,
    pub shifts: Vec<Renumber<Id>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceError {
    /// The record is not a member of the sibling set it was planned against.
    NotASibling { id: String },
}

impl std::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceError::NotASibling { id } => {
                write!(f, "record {id} is not in this sibling set")
            }
        }
    }
}

impl std::error::Error for SequenceError {}

fn to_order(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Clamp a requested insert position to `[1, len + 1]`.
pub fn clamp_insert(requested: i64, len: usize) -> i32 {
    let upper = len as i64 + 1;
    to_order(requested.clamp(1, upper))
}

/// Clamp a requested move target to `[1, len]`. A move never changes `len`.
pub fn clamp_move(requested: i64, len: usize) -> i32 {
    let upper = (len as i64).max(1);
    to_order(requested.clamp(1, upper))
}

/// Plan an insert at `requested`. Every sibling at or after the clamped
/// position shifts down by one.
pub fn plan_insert<T: Sequenced>(siblings: &[T], requested: i64) -> InsertPlan<T::Id> {
    let order = clamp_insert(requested, siblings.len());
    let shifts = siblings
        .iter()
        .filter(|s| s.seq_order() >= order)
        .map(|s| Renumber {
            id: s.seq_id(),
            order: s.seq_order() + 1,
        })
        .collect();

    InsertPlan { order, shifts }
}

/// Plan moving `id` to `requested`.
///
/// - Up (higher order): siblings in `(from, to]` shift up by one.
/// - Down (lower order): siblings in `[to, from)` shift down by one.
pub fn plan_move<T: Sequenced>(
    siblings: &[T],
    id: T::Id,
    requested: i64,
) -> Result<MovePlan<T::Id>, SequenceError> {
    let target = find(siblings, id)?;
    let from = target.seq_order();
    let to = clamp_move(requested, siblings.len());

    let mut shifts = Vec::new();
    if to > from {
        for s in siblings {
            let o = s.seq_order();
            if s.seq_id() != id && o > from && o <= to {
                shifts.push(Renumber {
                    id: s.seq_id(),
                    order: o - 1,
                });
            }
        }
    } else if to < from {
        for s in siblings {
            let o = s.seq_order();
            if s.seq_id() != id && o >= to && o < from {
                shifts.push(Renumber {
                    id: s.seq_id(),
                    order: o + 1,
                });
            }
        }
    }

    Ok(MovePlan {
        id,
        from,
        to,
        shifts,
    })
}

/// Plan removing `id`. Every sibling after it shifts up by one.
pub fn plan_remove<T: Sequenced>(
    siblings: &[T],
    id: T::Id,
) -> Result<RemovePlan<T::Id>, SequenceError> {
    let removed_order = find(siblings, id)?.seq_order();
    let shifts = siblings
        .iter()
        .filter(|s| s.seq_id() != id && s.seq_order() > removed_order)
        .map(|s| Renumber {
            id: s.seq_id(),
            order: s.seq_order() - 1,
        })
        .collect();

    Ok(RemovePlan {
        id,
        removed_order,
        shifts,
    })
}

fn find<T: Sequenced>(siblings: &[T], id: T::Id) -> Result<&T, SequenceError> {
    siblings
        .iter()
        .find(|s| s.seq_id() == id)
        .ok_or_else(|| SequenceError::NotASibling {
            id: format!("{id:?}"),
        })
}
