use crate::models::schedule::{ConstraintKind, ScheduleConstraint, ScheduledTask, TimeSlot};

/// Hard-constraint checks for a candidate slot.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintValidator {
    fixed_priority_threshold: u8,
}

impl ConstraintValidator {
    pub fn new(fixed_priority_threshold: u8) -> Self {
        Self {
            fixed_priority_threshold,
        }
    }

    /// Whether `constraint` forbids placing anything inside its window.
    pub fn blocks(&self, constraint: &ScheduleConstraint) -> bool {
        match constraint.kind {
            ConstraintKind::Unavailable => true,
            ConstraintKind::Fixed => constraint
                .priority
                .map(|priority| priority > self.fixed_priority_threshold)
                .unwrap_or(false),
            ConstraintKind::Flexible => false,
        }
    }

    pub fn violates_constraints(&self, slot: &TimeSlot, constraints: &[ScheduleConstraint]) -> bool {
        constraints.iter().any(|constraint| {
            self.blocks(constraint) && slot.overlaps(constraint.start_at, constraint.end_at)
        })
    }

    pub fn collides_with<'t, I>(&self, slot: &TimeSlot, existing: I) -> bool
    where
        I: IntoIterator<Item = &'t ScheduledTask>,
    {
        existing
            .into_iter()
            .any(|scheduled| slot.overlaps(scheduled.start_time, scheduled.end_time))
    }

    pub fn is_slot_valid<'t, I>(
        &self,
        slot: &TimeSlot,
        constraints: &[ScheduleConstraint],
        existing: I,
    ) -> bool
    where
        I: IntoIterator<Item = &'t ScheduledTask>,
    {
        !self.violates_constraints(slot, constraints) && !self.collides_with(slot, existing)
    }
}
