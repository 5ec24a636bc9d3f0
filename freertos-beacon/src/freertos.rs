//! FreeRTOS kernel wiring.
//!
//! The kernel's numeric hook parameters arrive as plain `u32`s so the hook
//! surface stays independent of any one FreeRTOS version's headers. The
//! enums below give those numbers names on the Rust side; each matches the
//! kernel constant of the same meaning.
//!
//! A port connects hook points like so (names on the left are the kernel's
//! `trace*` macros, right the [`KernelTracer`](crate::hooks::KernelTracer)
//! method):
//!
//! - `traceTASK_SWITCHED_IN()` → `task_switched_in(current_tcb)`
//! - `traceQUEUE_SEND(pxQueue)` → `queue_send(queue, messages_waiting)`
//! - `traceQUEUE_RECEIVE(pxQueue)` →
//!   `queue_receive(queue, ticks_to_wait, messages_waiting)`
//! - `traceTASK_NOTIFY(uxIndexToNotify)` →
//!   `task_notify(task_to_notify, index, action, value)`
//! - `traceTIMER_COMMAND_SEND(...)` →
//!   `timer_command_send(timer, command_id, optional_value, status)`
//!
//! …and so on; every `trace*` point of the kernel has a method of the same
//! name in snake case. Values the C macros read from enclosing scope
//! (`pxCurrentTCB`, `xTicksToWait`, `xCopyPosition`) are passed explicitly.
//!
//! The host also implements [`hooks::TraceHandle`](crate::hooks::TraceHandle)
//! for its task, queue and timer handle types, returning the configured
//! display name where one exists.

/// Where a send places its item, `xCopyPosition` in the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum CopyPosition {
    SendToBack = 0,
    SendToFront = 1,
    Overwrite = 2,
}

/// What a queue handle actually is, `ucQueueType` in the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum QueueKind {
    Queue = 0,
    Mutex = 1,
    CountingSemaphore = 2,
    BinarySemaphore = 3,
    RecursiveMutex = 4,
    QueueSet = 5,
}

/// Stream buffer flavor, `xStreamBufferType` in the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum StreamBufferKind {
    Stream = 0,
    Message = 1,
    Batching = 2,
}

/// Notification update action, `eNotifyAction` in the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum NotifyAction {
    NoAction = 0,
    SetBits = 1,
    Increment = 2,
    SetValueWithOverwrite = 3,
    SetValueWithoutOverwrite = 4,
}

impl CopyPosition {
    pub const fn word(self) -> u32 {
        self as u32
    }
}

impl QueueKind {
    pub const fn word(self) -> u32 {
        self as u32
    }
}

impl StreamBufferKind {
    pub const fn word(self) -> u32 {
        self as u32
    }
}

impl NotifyAction {
    pub const fn word(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassMask, TraceConfig};
    use crate::hooks::{KernelTracer, TraceHandle};
    use crate::arbitrary_int::u5;
    use crate::protocol::{FilterAssignment, MessageId};
    use std::sync::Mutex;
    use std::vec::Vec;

    struct FakeQueue {
        name: Option<&'static str>,
    }

    impl TraceHandle for FakeQueue {
        fn name(&self) -> Option<&str> {
            self.name
        }
    }

    static CAPTURED: Mutex<Vec<(u8, u8, Vec<u32>)>> = Mutex::new(Vec::new());

    #[unsafe(no_mangle)]
    fn write_trace_message(message_id: u8, filter: u8, words: &[u32]) {
        CAPTURED
            .lock()
            .unwrap()
            .push((message_id, filter, words.to_vec()));
    }

    #[test]
    fn test_port_level_flow() {
        static TRACER: KernelTracer = KernelTracer::new(TraceConfig {
            classes: ClassMask::ALL,
            queue_registry: true,
            filters: FilterAssignment::new(u5::new(0), u5::new(1)).with_queue(u5::new(4)),
        });

        let queue = FakeQueue { name: Some("CmdQ") };

        CAPTURED.lock().unwrap().clear();
        TRACER.queue_create(Some(&queue), QueueKind::Mutex.word());
        TRACER.queue_send(Some(&queue), 1);
        TRACER.blocking_on_queue_send(Some(&queue), CopyPosition::SendToFront.word());

        let log = CAPTURED.lock().unwrap();
        assert_eq!(log.len(), 3);

        let name = u32::from_le_bytes(*b"CmdQ");
        assert_eq!(log[0], (MessageId::QueueCreate as u8, 4, std::vec![name, 1]));
        assert_eq!(log[1], (MessageId::QueueSend as u8, 0, std::vec![name, 1]));
        assert_eq!(
            log[2],
            (MessageId::BlockingOnQueueSend as u8, 1, std::vec![name, 1])
        );
    }

    #[test]
    fn test_kernel_constant_values() {
        assert_eq!(QueueKind::QueueSet.word(), 5);
        assert_eq!(CopyPosition::Overwrite.word(), 2);
        assert_eq!(StreamBufferKind::Batching.word(), 2);
        assert_eq!(NotifyAction::SetValueWithoutOverwrite.word(), 4);
    }
}
