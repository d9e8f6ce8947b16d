//! The editable five-function program table.
//!
//! A [`Program`] holds one slot list per [`FunctionId`]. Each list is sized
//! to the level's capacity when the program is created and never resized
//! afterwards; the editing operations only replace slot contents. The
//! interpreter reads a program but never mutates it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Action, Condition, FunctionId};
use crate::structs::Command;

/// Number of fixed function slots.
pub const FUNCTION_COUNT: usize = 5;

/// Per-function slot capacities, indexed by [`FunctionId::index`].
pub type Capacities = [u8; FUNCTION_COUNT];

/// Address of one slot inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotRef {
    /// The function owning the slot.
    pub function: FunctionId,
    /// Zero-based slot position.
    pub index: usize,
}

impl SlotRef {
    /// Build a slot reference.
    pub const fn new(function: FunctionId, index: usize) -> Self {
        Self { function, index }
    }
}

/// Errors raised by program editing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    /// The function has zero capacity on this level.
    #[error("function {0} is not available on this level")]
    FunctionUnavailable(FunctionId),

    /// The slot index is past the function's capacity.
    #[error("slot {index} is out of range for {function} (capacity {capacity})")]
    SlotOutOfRange {
        /// The function addressed.
        function: FunctionId,
        /// The requested index.
        index: usize,
        /// The function's capacity.
        capacity: usize,
    },

    /// More commands than the function can hold.
    #[error("{function} holds {capacity} commands, got {given}")]
    CapacityExceeded {
        /// The function addressed.
        function: FunctionId,
        /// The function's capacity.
        capacity: usize,
        /// Number of commands supplied.
        given: usize,
    },
}

/// A fixed table `F1..F5 -> ordered slots`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Program {
    functions: [Vec<Option<Command>>; FUNCTION_COUNT],
}

impl Program {
    /// An empty program with the given slot capacities.
    pub fn with_capacities(capacities: Capacities) -> Self {
        Self {
            functions: capacities.map(|cap| vec![None; usize::from(cap)]),
        }
    }

    /// Number of slots in `function`.
    pub fn capacity(&self, function: FunctionId) -> usize {
        self.function_slots(function).len()
    }

    /// Slot capacities of every function.
    pub fn capacities(&self) -> Capacities {
        FunctionId::ALL.map(|f| u8::try_from(self.capacity(f)).unwrap_or(u8::MAX))
    }

    /// Whether this program's shape matches `capacities` exactly.
    pub fn fits(&self, capacities: Capacities) -> bool {
        FunctionId::ALL
            .iter()
            .zip(capacities)
            .all(|(f, cap)| self.capacity(*f) == usize::from(cap))
    }

    /// The slots of `function`, in execution order.
    pub fn slots(&self, function: FunctionId) -> &[Option<Command>] {
        self.function_slots(function)
    }

    /// The command at `slot`, if the slot exists and is filled.
    pub fn get(&self, slot: SlotRef) -> Option<Command> {
        self.function_slots(slot.function)
            .get(slot.index)
            .copied()
            .flatten()
    }

    /// Filled commands of `function` in order, skipping empty slots.
    pub fn commands(&self, function: FunctionId) -> impl Iterator<Item = Command> + '_ {
        self.function_slots(function).iter().filter_map(|s| *s)
    }

    /// Whether no slot in any function is filled.
    pub fn is_empty(&self) -> bool {
        self.functions.iter().flatten().all(Option::is_none)
    }

    /// The slot selected when a level is opened: index 0 of the first
    /// function with non-zero capacity.
    pub fn first_available_slot(&self) -> Option<SlotRef> {
        FunctionId::ALL
            .into_iter()
            .find(|f| self.capacity(*f) > 0)
            .map(|f| SlotRef::new(f, 0))
    }

    /// Place `action` in `slot`, keeping any condition already there.
    ///
    /// Returns the slot to select next: the following slot of the same
    /// function, or `slot` itself when it was the last one.
    pub fn set_action(&mut self, slot: SlotRef, action: Action) -> Result<SlotRef, ProgramError> {
        let capacity = self.capacity(slot.function);
        let cell = self.slot_mut(slot)?;
        let condition = cell.and_then(|c| c.condition);
        *cell = Some(Command { action, condition });

        let next = slot.index.saturating_add(1);
        if next < capacity {
            Ok(SlotRef::new(slot.function, next))
        } else {
            Ok(slot)
        }
    }

    /// Toggle `condition` on the command in `slot`.
    ///
    /// Setting the condition already present clears it. An empty slot is
    /// left untouched.
    pub fn toggle_condition(
        &mut self,
        slot: SlotRef,
        condition: Condition,
    ) -> Result<(), ProgramError> {
        if let Some(command) = self.slot_mut(slot)? {
            command.condition = if command.condition == Some(condition) {
                None
            } else {
                Some(condition)
            };
        }
        Ok(())
    }

    /// Empty `slot`, returning what was there.
    pub fn clear_slot(&mut self, slot: SlotRef) -> Result<Option<Command>, ProgramError> {
        Ok(self.slot_mut(slot)?.take())
    }

    /// Replace the whole body of `function`; unused trailing slots are
    /// emptied.
    pub fn load_function(
        &mut self,
        function: FunctionId,
        commands: &[Command],
    ) -> Result<(), ProgramError> {
        let capacity = self.capacity(function);
        if capacity == 0 && !commands.is_empty() {
            return Err(ProgramError::FunctionUnavailable(function));
        }
        if commands.len() > capacity {
            return Err(ProgramError::CapacityExceeded {
                function,
                capacity,
                given: commands.len(),
            });
        }
        self.fill(function, commands);
        Ok(())
    }

    /// Like [`Program::load_function`] but drops commands past the capacity.
    ///
    /// Returns how many commands were dropped.
    pub fn load_truncated(&mut self, function: FunctionId, commands: &[Command]) -> usize {
        let capacity = self.capacity(function);
        let kept = commands.len().min(capacity);
        self.fill(function, commands.get(..kept).unwrap_or_default());
        commands.len().saturating_sub(kept)
    }

    fn fill(&mut self, function: FunctionId, commands: &[Command]) {
        let slots = self.function_slots_mut(function);
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = commands.get(i).copied();
        }
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Result<&mut Option<Command>, ProgramError> {
        let capacity = self.capacity(slot.function);
        if capacity == 0 {
            return Err(ProgramError::FunctionUnavailable(slot.function));
        }
        self.function_slots_mut(slot.function)
            .get_mut(slot.index)
            .ok_or(ProgramError::SlotOutOfRange {
                function: slot.function,
                index: slot.index,
                capacity,
            })
    }

    fn function_slots(&self, function: FunctionId) -> &[Option<Command>] {
        match self.functions.get(function.index()) {
            Some(slots) => slots,
            None => &[],
        }
    }

    fn function_slots_mut(&mut self, function: FunctionId) -> &mut [Option<Command>] {
        match self.functions.get_mut(function.index()) {
            Some(slots) => slots,
            None => &mut [],
        }
    }
}
