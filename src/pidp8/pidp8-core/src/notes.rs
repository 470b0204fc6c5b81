use heapless::spsc::{Consumer, Producer, Queue};

use crate::panel::DepOrientation;

// Usable capacity is one less than the queue length
pub const NOTE_QUEUE_LEN: usize = 16;

/// Diagnostics raised inside the real-time loop, logged later by the control thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanNote {
    DepCalibrated(DepOrientation),
    SlowCycle { micros: u32 },
}

pub type NoteQueue = Queue<ScanNote, NOTE_QUEUE_LEN>;
pub type NoteProducer<'a> = Producer<'a, ScanNote, NOTE_QUEUE_LEN>;
pub type NoteConsumer<'a> = Consumer<'a, ScanNote, NOTE_QUEUE_LEN>;

/// Queues a note without blocking; a full queue drops it
pub fn post(notes: &mut Option<NoteProducer<'_>>, note: ScanNote) {
    if let Some(producer) = notes {
        let _dropped = producer.enqueue(note);
    }
}
