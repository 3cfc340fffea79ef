//! Authoritative slot storage for a single side's 3×6 grid.

use lucky_defense_core::{RandomSource, SlotCoord, StackId, TowerKind, SLOT_COUNT};
use thiserror::Error;

/// Units of one tower kind occupying a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stack {
    id: StackId,
    kind: TowerKind,
    count: u8,
}

impl Stack {
    /// Stable handle of the stack; survives relocation.
    #[must_use]
    pub const fn id(&self) -> StackId {
        self.id
    }

    /// Kind of every unit in the stack.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Number of units in the stack.
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }

    /// Whether the stack reached its kind's cap.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.count >= self.kind.stack_cap()
    }
}

/// Reasons a primitive grid mutation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum GridError {
    /// The coordinate lies outside the grid.
    #[error("slot index is outside the grid")]
    InvalidSlotIndex,
    /// The slot holds no units.
    #[error("slot is empty")]
    EmptySlot,
    /// The slot holds a different kind.
    #[error("slot holds a different tower kind")]
    KindMismatch,
    /// The slot's stack reached its cap.
    #[error("slot stack is full")]
    StackFull,
}

/// Slot array for one side. A slot is either empty or holds a non-empty stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    slots: [Option<Stack>; SLOT_COUNT],
    next_stack: u32,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new()
    }
}

impl GridState {
    /// Creates a grid whose slots are all empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [None; SLOT_COUNT],
            next_stack: 0,
        }
    }

    /// Stack stored at the slot; `None` for empty or out-of-range slots.
    #[must_use]
    pub fn stack(&self, slot: SlotCoord) -> Option<Stack> {
        slot.index().and_then(|index| self.slots[index])
    }

    /// Iterates over occupied slots in row-major order.
    pub fn stacks(&self) -> impl Iterator<Item = (SlotCoord, Stack)> + '_ {
        SlotCoord::all().filter_map(|slot| self.stack(slot).map(|stack| (slot, stack)))
    }

    /// Total number of units across every stack.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.stacks().map(|(_, stack)| usize::from(stack.count)).sum()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether a unit of `kind` may be added to the slot.
    #[must_use]
    pub fn can_accept(&self, slot: SlotCoord, kind: TowerKind) -> bool {
        match slot.index() {
            None => false,
            Some(index) => match self.slots[index] {
                None => true,
                Some(stack) => stack.kind == kind && !stack.is_full(),
            },
        }
    }

    /// First empty slot in row-major order.
    #[must_use]
    pub fn first_empty(&self) -> Option<SlotCoord> {
        SlotCoord::all().find(|slot| self.stack(*slot).is_none())
    }

    /// First slot in row-major order holding `kind`.
    #[must_use]
    pub fn first_holding(&self, kind: TowerKind) -> Option<SlotCoord> {
        self.stacks()
            .find(|(_, stack)| stack.kind == kind)
            .map(|(slot, _)| slot)
    }

    /// First slot in row-major order holding a full stack of `kind`.
    #[must_use]
    pub fn first_full(&self, kind: TowerKind) -> Option<SlotCoord> {
        self.stacks()
            .find(|(_, stack)| stack.kind == kind && stack.is_full())
            .map(|(slot, _)| slot)
    }

    /// Chooses where a new unit of `kind` lands.
    ///
    /// Non-full slots already holding `kind` are preferred; otherwise an empty
    /// slot is used. Each candidate set is sampled uniformly. `reserved` is
    /// treated as occupied by a foreign kind.
    pub fn select_slot(
        &self,
        kind: TowerKind,
        reserved: Option<SlotCoord>,
        rng: &mut dyn RandomSource,
    ) -> Option<SlotCoord> {
        let available = |slot: &SlotCoord| Some(*slot) != reserved;

        let matching: Vec<SlotCoord> = self
            .stacks()
            .filter(|(slot, stack)| available(slot) && stack.kind == kind && !stack.is_full())
            .map(|(slot, _)| slot)
            .collect();
        if !matching.is_empty() {
            return Some(matching[rng.pick_index(matching.len())]);
        }

        let empty: Vec<SlotCoord> = SlotCoord::all()
            .filter(|slot| available(slot) && self.stack(*slot).is_none())
            .collect();
        if empty.is_empty() {
            return None;
        }
        Some(empty[rng.pick_index(empty.len())])
    }

    /// Adds one unit of `kind`, creating a stack when the slot is empty.
    ///
    /// Returns the stack after the addition.
    pub fn add_unit(&mut self, slot: SlotCoord, kind: TowerKind) -> Result<Stack, GridError> {
        let index = slot.index().ok_or(GridError::InvalidSlotIndex)?;
        let stack = match self.slots[index] {
            None => {
                let id = StackId::new(self.next_stack);
                self.next_stack = self.next_stack.wrapping_add(1);
                Stack { id, kind, count: 1 }
            }
            Some(stack) if stack.kind != kind => return Err(GridError::KindMismatch),
            Some(stack) if stack.is_full() => return Err(GridError::StackFull),
            Some(stack) => Stack {
                count: stack.count + 1,
                ..stack
            },
        };
        self.slots[index] = Some(stack);
        Ok(stack)
    }

    /// Removes one unit, clearing the slot when its last unit leaves.
    ///
    /// Returns the stack as it was before the removal.
    pub fn remove_unit(&mut self, slot: SlotCoord) -> Result<Stack, GridError> {
        let index = slot.index().ok_or(GridError::InvalidSlotIndex)?;
        let stack = self.slots[index].ok_or(GridError::EmptySlot)?;
        self.slots[index] = if stack.count > 1 {
            Some(Stack {
                count: stack.count - 1,
                ..stack
            })
        } else {
            None
        };
        Ok(stack)
    }

    /// Clears the slot and returns its whole stack.
    pub fn take(&mut self, slot: SlotCoord) -> Result<Stack, GridError> {
        let index = slot.index().ok_or(GridError::InvalidSlotIndex)?;
        self.slots[index].take().ok_or(GridError::EmptySlot)
    }

    /// Exchanges the contents of two slots; either may be empty.
    pub fn swap(&mut self, first: SlotCoord, second: SlotCoord) -> Result<(), GridError> {
        let first = first.index().ok_or(GridError::InvalidSlotIndex)?;
        let second = second.index().ok_or(GridError::InvalidSlotIndex)?;
        self.slots.swap(first, second);
        Ok(())
    }
}
