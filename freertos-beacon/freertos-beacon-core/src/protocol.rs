//! Message ids and recorder filter classes.
//!
//! Each kernel instrumentation point has a fixed [`MessageId`]; the recorder
//! additionally receives a filter number so whole groups of messages can be
//! enabled or disabled on the capture side without rebuilding. Filter
//! numbers are recorder-owned; this crate only routes each message through
//! the number assigned to its class.

use arbitrary_int::u5;

/// One variant per kernel instrumentation point.
///
/// The discriminant is the wire id. Ids are append-only: a decoder built for
/// an older firmware must keep understanding the ids it knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MessageId {
    // Scheduler
    TaskSwitchedIn = 0,
    TaskSwitchedOut = 1,
    StartingScheduler = 2,

    // Task lifecycle and state
    TaskCreate = 3,
    TaskCreateFailed = 4,
    TaskDelete = 5,
    TaskSuspend = 6,
    TaskResume = 7,
    TaskResumeFromIsr = 8,
    TaskPrioritySet = 9,
    TaskPriorityInherit = 10,
    TaskPriorityDisinherit = 11,
    TaskDelay = 12,
    TaskDelayUntil = 13,
    TaskIncrementTick = 14,
    IncreaseTickCount = 15,
    LowPowerIdleBegin = 16,
    LowPowerIdleEnd = 17,
    MovedTaskToReadyState = 18,
    PostMovedTaskToReadyState = 19,
    MovedTaskToDelayedList = 20,
    MovedTaskToOverflowDelayedList = 21,

    // Queues, semaphores and mutexes
    QueueCreate = 22,
    QueueCreateFailed = 23,
    QueueSend = 24,
    QueueSendFailed = 25,
    QueueReceive = 26,
    QueueReceiveFailed = 27,
    QueuePeek = 28,
    QueuePeekFailed = 29,
    QueueSendFromIsr = 30,
    QueueSendFromIsrFailed = 31,
    QueueReceiveFromIsr = 32,
    QueueReceiveFromIsrFailed = 33,
    QueuePeekFromIsr = 34,
    QueuePeekFromIsrFailed = 35,
    QueueDelete = 36,
    QueueRegistryAdd = 37,
    BlockingOnQueueReceive = 38,
    BlockingOnQueuePeek = 39,
    BlockingOnQueueSend = 40,
    CreateMutex = 41,
    CreateMutexFailed = 42,
    GiveMutexRecursive = 43,
    GiveMutexRecursiveFailed = 44,
    TakeMutexRecursive = 45,
    TakeMutexRecursiveFailed = 46,
    CreateCountingSemaphore = 47,
    CreateCountingSemaphoreFailed = 48,

    // Direct-to-task notifications (indexed, FreeRTOS v10.4+)
    TaskNotify = 49,
    TaskNotifyFromIsr = 50,
    TaskNotifyGiveFromIsr = 51,
    TaskNotifyTake = 52,
    TaskNotifyTakeBlock = 53,
    TaskNotifyWait = 54,
    TaskNotifyWaitBlock = 55,

    // Software timers and pended functions
    TimerCreate = 56,
    TimerCreateFailed = 57,
    TimerCommandSend = 58,
    TimerCommandReceived = 59,
    TimerExpired = 60,
    PendFuncCall = 61,
    PendFuncCallFromIsr = 62,

    // Heap
    Malloc = 63,
    Free = 64,

    // Event groups
    EventGroupCreate = 65,
    EventGroupCreateFailed = 66,
    EventGroupSyncBlock = 67,
    EventGroupSyncEnd = 68,
    EventGroupWaitBitsBlock = 69,
    EventGroupWaitBitsEnd = 70,
    EventGroupClearBits = 71,
    EventGroupClearBitsFromIsr = 72,
    EventGroupSetBits = 73,
    EventGroupSetBitsFromIsr = 74,
    EventGroupDelete = 75,

    // Stream and message buffers
    StreamBufferCreate = 76,
    StreamBufferCreateFailed = 77,
    StreamBufferCreateStaticFailed = 78,
    StreamBufferDelete = 79,
    StreamBufferReset = 80,
    StreamBufferResetFromIsr = 81,
    BlockingOnStreamBufferSend = 82,
    StreamBufferSend = 83,
    StreamBufferSendFailed = 84,
    StreamBufferSendFromIsr = 85,
    BlockingOnStreamBufferReceive = 86,
    StreamBufferReceive = 87,
    StreamBufferReceiveFailed = 88,
    StreamBufferReceiveFromIsr = 89,

    // Interrupt markers
    IsrEnter = 90,
    IsrExit = 91,
    IsrExitToScheduler = 92,

    /// Synthesized by the recorder sink after an overflow, carrying the
    /// number of messages that were lost. Never emitted by a hook.
    TraceDataLost = 255,
}

/// The seven message groups a host can enable independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FilterClass {
    /// Most important task, queue and notification messages.
    Basic = 0,
    /// Task state changes, ticks, event groups, blocking markers.
    Tasks = 1,
    /// Heap allocate and free.
    Malloc = 2,
    /// Software timer commands and expiry.
    Timer = 3,
    /// Queue, semaphore and mutex lifecycle.
    Queue = 4,
    /// Stream and message buffer activity.
    Streams = 5,
    /// Scheduler internals and ISR markers.
    Expert = 6,
}

/// Recorder filter numbers per class.
///
/// Only `Basic` and `Tasks` need explicit numbers; every other class falls
/// back when unassigned — `Malloc` onto `Basic`, the rest onto `Tasks` —
/// so a host that only reserves two recorder filters still captures
/// everything it enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterAssignment {
    basic: u5,
    tasks: u5,
    malloc: Option<u5>,
    timer: Option<u5>,
    queue: Option<u5>,
    streams: Option<u5>,
    expert: Option<u5>,
}

impl FilterAssignment {
    pub const fn new(basic: u5, tasks: u5) -> Self {
        FilterAssignment {
            basic,
            tasks,
            malloc: None,
            timer: None,
            queue: None,
            streams: None,
            expert: None,
        }
    }

    pub const fn with_malloc(mut self, filter: u5) -> Self {
        self.malloc = Some(filter);
        self
    }

    pub const fn with_timer(mut self, filter: u5) -> Self {
        self.timer = Some(filter);
        self
    }

    pub const fn with_queue(mut self, filter: u5) -> Self {
        self.queue = Some(filter);
        self
    }

    pub const fn with_streams(mut self, filter: u5) -> Self {
        self.streams = Some(filter);
        self
    }

    pub const fn with_expert(mut self, filter: u5) -> Self {
        self.expert = Some(filter);
        self
    }

    /// The recorder filter number used for messages of `class`.
    pub const fn resolve(&self, class: FilterClass) -> u5 {
        match class {
            FilterClass::Basic => self.basic,
            FilterClass::Tasks => self.tasks,
            FilterClass::Malloc => match self.malloc {
                Some(filter) => filter,
                None => self.basic,
            },
            FilterClass::Timer => match self.timer {
                Some(filter) => filter,
                None => self.tasks,
            },
            FilterClass::Queue => match self.queue {
                Some(filter) => filter,
                None => self.tasks,
            },
            FilterClass::Streams => match self.streams {
                Some(filter) => filter,
                None => self.tasks,
            },
            FilterClass::Expert => match self.expert {
                Some(filter) => filter,
                None => self.tasks,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_classes_fall_back() {
        let filters = FilterAssignment::new(u5::new(0), u5::new(1));
        assert_eq!(filters.resolve(FilterClass::Basic), u5::new(0));
        assert_eq!(filters.resolve(FilterClass::Tasks), u5::new(1));
        assert_eq!(filters.resolve(FilterClass::Malloc), u5::new(0));
        assert_eq!(filters.resolve(FilterClass::Timer), u5::new(1));
        assert_eq!(filters.resolve(FilterClass::Queue), u5::new(1));
        assert_eq!(filters.resolve(FilterClass::Streams), u5::new(1));
        assert_eq!(filters.resolve(FilterClass::Expert), u5::new(1));
    }

    #[test]
    fn test_explicit_assignment_overrides_fallback() {
        let filters = FilterAssignment::new(u5::new(0), u5::new(1))
            .with_malloc(u5::new(7))
            .with_queue(u5::new(8))
            .with_expert(u5::new(31));
        assert_eq!(filters.resolve(FilterClass::Malloc), u5::new(7));
        assert_eq!(filters.resolve(FilterClass::Queue), u5::new(8));
        assert_eq!(filters.resolve(FilterClass::Expert), u5::new(31));
        // Untouched classes keep falling back
        assert_eq!(filters.resolve(FilterClass::Streams), u5::new(1));
    }
}
