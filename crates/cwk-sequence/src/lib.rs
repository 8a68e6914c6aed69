//! cwk-sequence
//!
//! Dense 1-based ordering over a sibling set (units of a course, lessons of a
//! unit).
//!
//! Rules:
//! - Orders are exactly `1..=N` after every insert, move and remove
//! - Requested positions are clamped, never rejected
//! - Moving a record to its current position changes nothing
//!
//! Deterministic, pure logic. No IO. Callers read the siblings, ask for a
//! plan, and write the plan back inside one storage transaction.

mod density;
mod plan;

pub use density::{check_dense, check_siblings, DensityViolation};
pub use plan::{
    clamp_insert, clamp_move, plan_insert, plan_move, plan_remove, InsertPlan, MovePlan,
    RemovePlan, Renumber, SequenceError,
};

use cwk_schemas::{Lesson, LessonId, Unit, UnitId};

/// A record that lives in an ordered sibling set.
pub trait Sequenced {
    type Id: Copy + Eq + std::fmt::Debug;

    fn seq_id(&self) -> Self::Id;
    fn seq_order(&self) -> i32;
}

impl Sequenced for Unit {
    type Id = UnitId;

    fn seq_id(&self) -> UnitId {
        self.id
    }

    fn seq_order(&self) -> i32 {
        self.order
    }
}

impl Sequenced for Lesson {
    type Id = LessonId;

    fn seq_id(&self) -> LessonId {
        self.id
    }

    fn seq_order(&self) -> i32 {
        self.order
    }
}
