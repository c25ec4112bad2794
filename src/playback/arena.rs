//! Generational arena holding buffers between submission and reclamation.

use crate::synth::SampleBuffer;

/// Opaque identity of a submitted buffer.
///
/// A slot index plus the generation it was issued in: once a slot is
/// reused, ids from earlier generations never match the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    index: u32,
    generation: u32,
}

impl BufferId {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a non-zero `u64` (zero is free for "no buffer").
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32 | self.index as u64) + 1
    }

    pub fn from_bits(bits: u64) -> Option<Self> {
        let raw = bits.checked_sub(1)?;
        Some(Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        })
    }
}

struct Slot {
    generation: u32,
    buffer: Option<SampleBuffer>,
}

#[derive(Default)]
pub struct BufferArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, buffer: SampleBuffer) -> BufferId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.buffer = Some(buffer);
            return BufferId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            buffer: Some(buffer),
        });
        BufferId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: BufferId) -> Option<&SampleBuffer> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.buffer.as_ref())
    }

    pub fn contains(&self, id: BufferId) -> bool {
        self.get(id).is_some()
    }

    /// Take the buffer out; its slot moves to the next generation.
    pub fn remove(&mut self, id: BufferId) -> Option<SampleBuffer> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let buffer = slot.buffer.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(buffer)
    }

    /// Drop every buffer. Outstanding ids all become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.buffer.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> SampleBuffer {
        SampleBuffer::from_mono(&[0.5; 4], 8_000)
    }

    #[test]
    fn insert_and_remove() {
        let mut arena = BufferArena::new();
        let a = arena.insert(buffer());
        let b = arena.insert(buffer());
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn reused_slot_gets_new_identity() {
        let mut arena = BufferArena::new();
        let old = arena.insert(buffer());
        arena.remove(old);

        let new = arena.insert(buffer());
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(arena.get(old).is_none());
        assert!(arena.get(new).is_some());
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena = BufferArena::new();
        let ids: Vec<_> = (0..5).map(|_| arena.insert(buffer())).collect();
        arena.clear();
        assert!(arena.is_empty());
        assert!(ids.iter().all(|&id| !arena.contains(id)));

        let fresh = arena.insert(buffer());
        assert!(!ids.contains(&fresh));
    }

    #[test]
    fn bits_round_trip_and_skip_zero() {
        let id = BufferId {
            index: 7,
            generation: 3,
        };
        assert_ne!(id.to_bits(), 0);
        assert_eq!(BufferId::from_bits(id.to_bits()), Some(id));
        assert_eq!(BufferId::from_bits(0), None);
    }
}
