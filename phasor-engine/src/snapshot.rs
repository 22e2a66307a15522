//! Lock-free single-writer snapshot cell (seqlock over atomics)
//!
//! The writer publishes a fixed-size record of `f64`s; readers always see a
//! complete record and never block the writer.

use std::hint;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::Arc;

struct Shared<const N: usize> {
    /// Odd while a write is in progress
    sequence: AtomicU64,
    slots: [AtomicU64; N],
}

/// Constructor for a writer/reader pair
pub struct SnapshotCell;

impl SnapshotCell {
    /// Create a cell holding `initial`
    pub fn split<const N: usize>(initial: [f64; N]) -> (SnapshotWriter<N>, SnapshotReader<N>) {
        let shared = Arc::new(Shared {
            sequence: AtomicU64::new(0),
            slots: std::array::from_fn(|i| AtomicU64::new(initial[i].to_bits())),
        });
        (
            SnapshotWriter {
                shared: shared.clone(),
            },
            SnapshotReader { shared },
        )
    }
}

/// The only handle allowed to publish; deliberately not `Clone`
pub struct SnapshotWriter<const N: usize> {
    shared: Arc<Shared<N>>,
}

impl<const N: usize> SnapshotWriter<N> {
    pub fn publish(&mut self, values: &[f64; N]) {
        let shared = &*self.shared;
        let seq = shared.sequence.load(Ordering::Relaxed);
        shared.sequence.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        for (slot, value) in shared.slots.iter().zip(values) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
        shared.sequence.store(seq.wrapping_add(2), Ordering::Release);
    }
}

/// Read handle; cheap to clone
#[derive(Clone)]
pub struct SnapshotReader<const N: usize> {
    shared: Arc<Shared<N>>,
}

impl<const N: usize> SnapshotReader<N> {
    /// Latest complete record
    pub fn load(&self) -> [f64; N] {
        let shared = &*self.shared;
        loop {
            let before = shared.sequence.load(Ordering::Acquire);
            if before & 1 == 1 {
                hint::spin_loop();
                continue;
            }
            let values: [f64; N] =
                std::array::from_fn(|i| f64::from_bits(shared.slots[i].load(Ordering::Relaxed)));
            fence(Ordering::Acquire);
            if shared.sequence.load(Ordering::Relaxed) == before {
                return values;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initial_value() {
        let (_writer, reader) = SnapshotCell::split([1.0, 2.0]);
        assert_eq!(reader.load(), [1.0, 2.0]);
    }

    #[test]
    fn test_publish_visible_to_clones() {
        let (mut writer, reader) = SnapshotCell::split([0.0; 3]);
        let other = reader.clone();
        writer.publish(&[1.0, 2.0, 3.0]);
        assert_eq!(reader.load(), [1.0, 2.0, 3.0]);
        assert_eq!(other.load(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_no_torn_reads_across_threads() {
        let (mut writer, reader) = SnapshotCell::split([0.0; 4]);
        let handle = thread::spawn(move || {
            for i in 1..=20_000 {
                let v = i as f64;
                writer.publish(&[v, v, v, v]);
            }
        });
        for _ in 0..20_000 {
            let record = reader.load();
            assert!(record.iter().all(|v| *v == record[0]));
        }
        handle.join().unwrap();
        assert_eq!(reader.load(), [20_000.0; 4]);
    }
}
