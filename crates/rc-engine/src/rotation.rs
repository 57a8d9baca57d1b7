//! Live rotation of ratio slots across physical outputs.

use arrayvec::ArrayVec;
use rc_ir::MAX_RATIO_CHANNELS;

/// A bijection from physical output index to logical ratio slot.
///
/// Both sides are zero-based over the ratio channels only; the master is
/// never rotated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationMap {
    slots: [u8; MAX_RATIO_CHANNELS],
    len: u8,
}

impl RotationMap {
    /// Output `i` carries slot `i`.
    pub fn identity(len: usize) -> Self {
        let len = len.min(MAX_RATIO_CHANNELS);
        let mut slots = [0u8; MAX_RATIO_CHANNELS];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { slots, len: len as u8 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Logical slot feeding physical output `output`.
    #[inline]
    pub fn slot_for_output(&self, output: usize) -> usize {
        if output < self.len() {
            self.slots[output] as usize
        } else {
            output
        }
    }

    /// Physical output fed by logical slot `slot`.
    pub fn output_for_slot(&self, slot: usize) -> Option<usize> {
        self.as_slice().iter().position(|&s| s as usize == slot)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.slots[..self.len()]
    }

    /// Shift every slot `amount` outputs forward: whatever output `k` carried
    /// moves to output `(k + amount) mod len`. Negative amounts shift back.
    pub fn rotated(&self, amount: i32) -> Self {
        let mut next = *self;
        let len = self.len() as i32;
        if len == 0 {
            return next;
        }
        for k in 0..len {
            let target = (k + amount).rem_euclid(len);
            next.slots[target as usize] = self.slots[k as usize];
        }
        next
    }

    /// Like [`RotationMap::rotated`], but cycling only through outputs marked
    /// enabled. Disabled outputs keep whatever they carried.
    pub fn rotated_among(&self, amount: i32, enabled: &[bool]) -> Self {
        let positions: ArrayVec<u8, MAX_RATIO_CHANNELS> = (0..self.len())
            .filter(|&p| enabled.get(p).copied().unwrap_or(false))
            .map(|p| p as u8)
            .collect();

        let mut next = *self;
        let count = positions.len() as i32;
        if count == 0 {
            return next;
        }
        for j in 0..count {
            let from = positions[j as usize] as usize;
            let to = positions[(j + amount).rem_euclid(count) as usize] as usize;
            next.slots[to] = self.slots[from];
        }
        next
    }

    /// True if the map is a permutation of `0..len`.
    pub fn is_permutation(&self) -> bool {
        let mut seen = [false; MAX_RATIO_CHANNELS];
        for &slot in self.as_slice() {
            let slot = slot as usize;
            if slot >= self.len() || seen[slot] {
                return false;
            }
            seen[slot] = true;
        }
        true
    }
}

impl Default for RotationMap {
    fn default() -> Self {
        Self::identity(0)
    }
}

/// Quantize a rotation control (knob plus CV, in slots) to a whole shift
/// within `-len..=len`.
pub fn quantize_rotation(amount: f32, len: usize) -> i32 {
    if !amount.is_finite() {
        return 0;
    }
    let limit = len as f32;
    libm::roundf(amount.clamp(-limit, limit)) as i32
}
