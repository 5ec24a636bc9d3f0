//! The kernel hook surface.
//!
//! One method per FreeRTOS trace hook point. The kernel port calls these
//! from wherever the corresponding `trace*` macro would fire, passing the
//! objects the macro would have read from the surrounding scope — there is
//! no hidden current-TCB global here, the caller threads every reference in
//! explicitly.
//!
//! Every method follows the same shape: bail out unless the message's class
//! is enabled, resolve object references to tokens, pack narrow fields, and
//! forward the words to the recorder. All of it is total, allocation-free
//! and safe to run from interrupt context.

use crate::config::TraceConfig;
use crate::pack::WordPacker;
use crate::protocol::{FilterClass, MessageId};
use crate::token::{NameFallback, Token, name_token, object_token};
use crate::tracing;

/// Name lookup for a traceable kernel object, supplied by the host kernel
/// per object kind (task, queue/semaphore/mutex, timer).
pub trait TraceHandle {
    /// The object's configured display name, or `None` if it was never
    /// given one.
    fn name(&self) -> Option<&str>;
}

fn task_token<T: TraceHandle>(task: Option<&T>) -> Token {
    object_token(task, TraceHandle::name, NameFallback::HexAddress)
}

fn timer_token<T: TraceHandle>(timer: Option<&T>) -> Token {
    object_token(timer, TraceHandle::name, NameFallback::HexAddress)
}

/// Address word for object kinds that have no name registry at all
/// (event groups, stream buffers). Truncating on 64-bit hosts is fine for
/// diagnostic identity.
fn address_word<T>(object: Option<&T>) -> u32 {
    match object {
        Some(object) => object as *const T as usize as u32,
        None => 0,
    }
}

/// Emits trace messages for one kernel instance.
///
/// Construct as a `const` so hooks of disabled classes compile down to
/// nothing.
pub struct KernelTracer {
    config: TraceConfig,
}

impl KernelTracer {
    pub const fn new(config: TraceConfig) -> Self {
        KernelTracer { config }
    }

    pub const fn config(&self) -> &TraceConfig {
        &self.config
    }

    #[inline]
    fn enabled(&self, class: FilterClass) -> bool {
        self.config.classes.contains(class)
    }

    fn send(&self, class: FilterClass, message: MessageId, words: &[u32]) {
        tracing::emit(message, self.config.filters.resolve(class), words);
    }

    fn queue_token<Q: TraceHandle>(&self, queue: Option<&Q>) -> Token {
        if self.config.queue_registry {
            object_token(queue, TraceHandle::name, NameFallback::HexAddress)
        } else {
            // No registry on this host: a name is categorically unobtainable
            object_token(queue, |_| None, NameFallback::Unnamed)
        }
    }

    // ---- Scheduler ----

    /// A task has been selected to run.
    #[inline]
    pub fn task_switched_in<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskSwitchedIn,
            &[task_token(task).raw()],
        );
    }

    /// The running task is about to be switched out.
    #[inline]
    pub fn task_switched_out<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(
            FilterClass::Expert,
            MessageId::TaskSwitchedOut,
            &[task_token(task).raw()],
        );
    }

    /// Idle and timer tasks exist; the scheduler is about to start.
    #[inline]
    pub fn starting_scheduler(&self) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(FilterClass::Expert, MessageId::StartingScheduler, &[]);
    }

    // ---- Task lifecycle and state ----

    #[inline]
    pub fn task_create<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::TaskCreate,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn task_create_failed(&self) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(FilterClass::Tasks, MessageId::TaskCreateFailed, &[]);
    }

    #[inline]
    pub fn task_delete<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::TaskDelete,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn task_suspend<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskSuspend,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn task_resume<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskResume,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn task_resume_from_isr<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskResumeFromIsr,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn task_priority_set<T: TraceHandle>(&self, task: Option<&T>, new_priority: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskPrioritySet,
            &[task_token(task).raw(), new_priority],
        );
    }

    /// A task is inheriting the priority of a higher-priority task that is
    /// waiting on a mutex it holds.
    #[inline]
    pub fn task_priority_inherit<T: TraceHandle>(
        &self,
        mutex_holder: Option<&T>,
        inherited_priority: u32,
    ) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::TaskPriorityInherit,
            &[task_token(mutex_holder).raw(), inherited_priority],
        );
    }

    /// A task is dropping back to its base priority after releasing the
    /// mutex it had inherited a priority through.
    #[inline]
    pub fn task_priority_disinherit<T: TraceHandle>(
        &self,
        mutex_holder: Option<&T>,
        base_priority: u32,
    ) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::TaskPriorityDisinherit,
            &[task_token(mutex_holder).raw(), base_priority],
        );
    }

    #[inline]
    pub fn task_delay(&self, ticks_to_delay: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(FilterClass::Basic, MessageId::TaskDelay, &[ticks_to_delay]);
    }

    #[inline]
    pub fn task_delay_until(&self, time_to_wake: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskDelayUntil,
            &[time_to_wake],
        );
    }

    #[inline]
    pub fn task_increment_tick(&self, tick_count: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::TaskIncrementTick,
            &[tick_count],
        );
    }

    /// Tick count is about to jump after waking from tickless idle.
    #[inline]
    pub fn increase_tick_count(&self, ticks_to_jump: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::IncreaseTickCount,
            &[ticks_to_jump],
        );
    }

    #[inline]
    pub fn low_power_idle_begin(&self) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(FilterClass::Tasks, MessageId::LowPowerIdleBegin, &[]);
    }

    #[inline]
    pub fn low_power_idle_end(&self) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(FilterClass::Tasks, MessageId::LowPowerIdleEnd, &[]);
    }

    #[inline]
    pub fn moved_task_to_ready_state<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(
            FilterClass::Expert,
            MessageId::MovedTaskToReadyState,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn post_moved_task_to_ready_state<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(
            FilterClass::Expert,
            MessageId::PostMovedTaskToReadyState,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn moved_task_to_delayed_list<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(
            FilterClass::Expert,
            MessageId::MovedTaskToDelayedList,
            &[task_token(task).raw()],
        );
    }

    #[inline]
    pub fn moved_task_to_overflow_delayed_list<T: TraceHandle>(&self, task: Option<&T>) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(
            FilterClass::Expert,
            MessageId::MovedTaskToOverflowDelayedList,
            &[task_token(task).raw()],
        );
    }

    // ---- Queues, semaphores and mutexes ----

    /// `queue_kind` values: 0 queue, 1 mutex, 2 counting semaphore,
    /// 3 binary semaphore, 4 recursive mutex, 5 queue set.
    #[inline]
    pub fn queue_create<Q: TraceHandle>(&self, queue: Option<&Q>, queue_kind: u32) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::QueueCreate,
            &[self.queue_token(queue).raw(), queue_kind],
        );
    }

    #[inline]
    pub fn queue_create_failed(&self, queue_kind: u32) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::QueueCreateFailed,
            &[queue_kind],
        );
    }

    #[inline]
    pub fn queue_send<Q: TraceHandle>(&self, queue: Option<&Q>, messages_waiting: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueSend,
            &[self.queue_token(queue).raw(), messages_waiting],
        );
    }

    /// Packed: ticks_to_wait (28 bits, bits 0-27, saturated),
    /// copy_position (4 bits, bits 28-31).
    #[inline]
    pub fn queue_send_failed<Q: TraceHandle>(
        &self,
        queue: Option<&Q>,
        ticks_to_wait: u32,
        copy_position: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(ticks_to_wait, 28, 0)
            .field(copy_position, 4, 28)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::QueueSendFailed,
            &[self.queue_token(queue).raw(), packed],
        );
    }

    /// Packed: ticks_to_wait (16 bits, bits 0-15, saturated),
    /// messages_waiting (16 bits, bits 16-31, saturated).
    #[inline]
    pub fn queue_receive<Q: TraceHandle>(
        &self,
        queue: Option<&Q>,
        ticks_to_wait: u32,
        messages_waiting: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(ticks_to_wait, 16, 0)
            .field(messages_waiting, 16, 16)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::QueueReceive,
            &[self.queue_token(queue).raw(), packed],
        );
    }

    #[inline]
    pub fn queue_receive_failed<Q: TraceHandle>(&self, queue: Option<&Q>, ticks_to_wait: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueReceiveFailed,
            &[self.queue_token(queue).raw(), ticks_to_wait],
        );
    }

    #[inline]
    pub fn queue_peek<Q: TraceHandle>(&self, queue: Option<&Q>, ticks_to_wait: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueuePeek,
            &[self.queue_token(queue).raw(), ticks_to_wait],
        );
    }

    #[inline]
    pub fn queue_peek_failed<Q: TraceHandle>(&self, queue: Option<&Q>, ticks_to_wait: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueuePeekFailed,
            &[self.queue_token(queue).raw(), ticks_to_wait],
        );
    }

    #[inline]
    pub fn queue_send_from_isr<Q: TraceHandle>(&self, queue: Option<&Q>, messages_waiting: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueSendFromIsr,
            &[self.queue_token(queue).raw(), messages_waiting],
        );
    }

    #[inline]
    pub fn queue_send_from_isr_failed<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueSendFromIsrFailed,
            &[self.queue_token(queue).raw()],
        );
    }

    #[inline]
    pub fn queue_receive_from_isr<Q: TraceHandle>(&self, queue: Option<&Q>, messages_waiting: u32) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueReceiveFromIsr,
            &[self.queue_token(queue).raw(), messages_waiting],
        );
    }

    #[inline]
    pub fn queue_receive_from_isr_failed<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueReceiveFromIsrFailed,
            &[self.queue_token(queue).raw()],
        );
    }

    #[inline]
    pub fn queue_peek_from_isr<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueuePeekFromIsr,
            &[self.queue_token(queue).raw()],
        );
    }

    #[inline]
    pub fn queue_peek_from_isr_failed<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueuePeekFromIsrFailed,
            &[self.queue_token(queue).raw()],
        );
    }

    #[inline]
    pub fn queue_delete<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::QueueDelete,
            &[self.queue_token(queue).raw()],
        );
    }

    /// A queue is being registered under a display name.
    #[inline]
    pub fn queue_registry_add<Q>(&self, queue: Option<&Q>, queue_name: &str) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(
            FilterClass::Expert,
            MessageId::QueueRegistryAdd,
            &[address_word(queue), name_token(Some(queue_name)).raw()],
        );
    }

    /// The calling task is about to block on an empty queue.
    #[inline]
    pub fn blocking_on_queue_receive<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::BlockingOnQueueReceive,
            &[self.queue_token(queue).raw()],
        );
    }

    #[inline]
    pub fn blocking_on_queue_peek<Q: TraceHandle>(&self, queue: Option<&Q>) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::BlockingOnQueuePeek,
            &[self.queue_token(queue).raw()],
        );
    }

    /// The calling task is about to block on a full queue.
    /// `copy_position` values: 0 send-to-back, 1 send-to-front, 2 overwrite.
    #[inline]
    pub fn blocking_on_queue_send<Q: TraceHandle>(&self, queue: Option<&Q>, copy_position: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::BlockingOnQueueSend,
            &[self.queue_token(queue).raw(), copy_position],
        );
    }

    #[inline]
    pub fn create_mutex<Q: TraceHandle>(&self, mutex: Option<&Q>) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::CreateMutex,
            &[self.queue_token(mutex).raw()],
        );
    }

    #[inline]
    pub fn create_mutex_failed(&self) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(FilterClass::Queue, MessageId::CreateMutexFailed, &[]);
    }

    #[inline]
    pub fn give_mutex_recursive<Q: TraceHandle>(&self, mutex: Option<&Q>) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::GiveMutexRecursive,
            &[self.queue_token(mutex).raw()],
        );
    }

    #[inline]
    pub fn give_mutex_recursive_failed<Q: TraceHandle>(&self, mutex: Option<&Q>) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::GiveMutexRecursiveFailed,
            &[self.queue_token(mutex).raw()],
        );
    }

    #[inline]
    pub fn take_mutex_recursive<Q: TraceHandle>(&self, mutex: Option<&Q>) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::TakeMutexRecursive,
            &[self.queue_token(mutex).raw()],
        );
    }

    #[inline]
    pub fn take_mutex_recursive_failed<Q: TraceHandle>(&self, mutex: Option<&Q>) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::TakeMutexRecursiveFailed,
            &[self.queue_token(mutex).raw()],
        );
    }

    /// Counting semaphores are anonymous at creation time; the raw handle
    /// address is recorded instead of a token.
    #[inline]
    pub fn create_counting_semaphore<Q>(
        &self,
        semaphore: Option<&Q>,
        max_count: u32,
        initial_count: u32,
    ) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::CreateCountingSemaphore,
            &[address_word(semaphore), max_count, initial_count],
        );
    }

    #[inline]
    pub fn create_counting_semaphore_failed(&self) {
        if !self.enabled(FilterClass::Queue) {
            return;
        }
        self.send(
            FilterClass::Queue,
            MessageId::CreateCountingSemaphoreFailed,
            &[],
        );
    }

    // ---- Direct-to-task notifications (indexed, v10.4+) ----

    /// Packed: index_to_notify (16 bits, bits 0-15), action (16 bits,
    /// bits 16-31).
    #[inline]
    pub fn task_notify<T: TraceHandle>(
        &self,
        task_to_notify: Option<&T>,
        index_to_notify: u32,
        action: u32,
        value: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(index_to_notify, 16, 0)
            .field(action, 16, 16)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotify,
            &[task_token(task_to_notify).raw(), packed, value],
        );
    }

    #[inline]
    pub fn task_notify_from_isr<T: TraceHandle>(
        &self,
        task_to_notify: Option<&T>,
        index_to_notify: u32,
        action: u32,
        value: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(index_to_notify, 16, 0)
            .field(action, 16, 16)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotifyFromIsr,
            &[task_token(task_to_notify).raw(), packed, value],
        );
    }

    #[inline]
    pub fn task_notify_give_from_isr<T: TraceHandle>(
        &self,
        task_to_notify: Option<&T>,
        index_to_notify: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotifyGiveFromIsr,
            &[task_token(task_to_notify).raw(), index_to_notify],
        );
    }

    /// Packed: index_to_wait (16 bits, bits 0-15), clear_count_on_exit
    /// (1 bit, bit 16).
    #[inline]
    pub fn task_notify_take<T: TraceHandle>(
        &self,
        current_task: Option<&T>,
        index_to_wait: u32,
        clear_count_on_exit: bool,
        ticks_to_wait: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(index_to_wait, 16, 0)
            .flag(clear_count_on_exit, 16)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotifyTake,
            &[task_token(current_task).raw(), packed, ticks_to_wait],
        );
    }

    /// The notification count is zero and the task is about to block.
    #[inline]
    pub fn task_notify_take_block<T: TraceHandle>(
        &self,
        current_task: Option<&T>,
        index_to_wait: u32,
        clear_count_on_exit: bool,
        ticks_to_wait: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(index_to_wait, 16, 0)
            .flag(clear_count_on_exit, 16)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotifyTakeBlock,
            &[task_token(current_task).raw(), packed, ticks_to_wait],
        );
    }

    /// Packed: index_to_wait (8 bits, bits 0-7), ticks_to_wait (24 bits,
    /// bits 8-31, saturated).
    #[inline]
    pub fn task_notify_wait<T: TraceHandle>(
        &self,
        current_task: Option<&T>,
        index_to_wait: u32,
        ticks_to_wait: u32,
        bits_to_clear_on_entry: u32,
        bits_to_clear_on_exit: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(index_to_wait, 8, 0)
            .field(ticks_to_wait, 24, 8)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotifyWait,
            &[
                task_token(current_task).raw(),
                packed,
                bits_to_clear_on_entry,
                bits_to_clear_on_exit,
            ],
        );
    }

    /// No notification is pending and the task is about to block.
    #[inline]
    pub fn task_notify_wait_block<T: TraceHandle>(
        &self,
        current_task: Option<&T>,
        index_to_wait: u32,
        ticks_to_wait: u32,
        bits_to_clear_on_entry: u32,
        bits_to_clear_on_exit: u32,
    ) {
        if !self.enabled(FilterClass::Basic) {
            return;
        }
        let packed = WordPacker::new()
            .field(index_to_wait, 8, 0)
            .field(ticks_to_wait, 24, 8)
            .finish();
        self.send(
            FilterClass::Basic,
            MessageId::TaskNotifyWaitBlock,
            &[
                task_token(current_task).raw(),
                packed,
                bits_to_clear_on_entry,
                bits_to_clear_on_exit,
            ],
        );
    }

    // ---- Software timers and pended functions ----

    #[inline]
    pub fn timer_create<T: TraceHandle>(&self, timer: Option<&T>, period_in_ticks: u32) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(
            FilterClass::Timer,
            MessageId::TimerCreate,
            &[timer_token(timer).raw(), period_in_ticks],
        );
    }

    #[inline]
    pub fn timer_create_failed(&self) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(FilterClass::Timer, MessageId::TimerCreateFailed, &[]);
    }

    /// A command is being sent to the timer service task.
    #[inline]
    pub fn timer_command_send<T: TraceHandle>(
        &self,
        timer: Option<&T>,
        command_id: u32,
        optional_value: u32,
        status: u32,
    ) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(
            FilterClass::Timer,
            MessageId::TimerCommandSend,
            &[timer_token(timer).raw(), command_id, optional_value, status],
        );
    }

    /// The timer service task took a command off its queue.
    #[inline]
    pub fn timer_command_received<T: TraceHandle>(
        &self,
        timer: Option<&T>,
        command_id: u32,
        command_value: u32,
    ) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(
            FilterClass::Timer,
            MessageId::TimerCommandReceived,
            &[timer_token(timer).raw(), command_id, command_value],
        );
    }

    #[inline]
    pub fn timer_expired<T: TraceHandle>(&self, timer: Option<&T>) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(
            FilterClass::Timer,
            MessageId::TimerExpired,
            &[timer_token(timer).raw()],
        );
    }

    #[inline]
    pub fn pend_func_call(&self, function: usize, param1: u32, param2: u32, status: u32) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(
            FilterClass::Timer,
            MessageId::PendFuncCall,
            &[function as u32, param1, param2, status],
        );
    }

    #[inline]
    pub fn pend_func_call_from_isr(&self, function: usize, param1: u32, param2: u32, status: u32) {
        if !self.enabled(FilterClass::Timer) {
            return;
        }
        self.send(
            FilterClass::Timer,
            MessageId::PendFuncCallFromIsr,
            &[function as u32, param1, param2, status],
        );
    }

    // ---- Heap ----

    #[inline]
    pub fn malloc(&self, address: usize, size: usize) {
        if !self.enabled(FilterClass::Malloc) {
            return;
        }
        self.send(
            FilterClass::Malloc,
            MessageId::Malloc,
            &[address as u32, size as u32],
        );
    }

    #[inline]
    pub fn free(&self, address: usize, size: usize) {
        if !self.enabled(FilterClass::Malloc) {
            return;
        }
        self.send(
            FilterClass::Malloc,
            MessageId::Free,
            &[address as u32, size as u32],
        );
    }

    // ---- Event groups ----

    #[inline]
    pub fn event_group_create<G>(&self, group: Option<&G>) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupCreate,
            &[address_word(group)],
        );
    }

    #[inline]
    pub fn event_group_create_failed(&self) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(FilterClass::Tasks, MessageId::EventGroupCreateFailed, &[]);
    }

    #[inline]
    pub fn event_group_sync_block<G>(
        &self,
        group: Option<&G>,
        bits_to_set: u32,
        bits_to_wait_for: u32,
    ) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupSyncBlock,
            &[address_word(group), bits_to_set, bits_to_wait_for],
        );
    }

    #[inline]
    pub fn event_group_sync_end<G>(
        &self,
        group: Option<&G>,
        bits_to_set: u32,
        bits_to_wait_for: u32,
        timeout_occurred: bool,
    ) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupSyncEnd,
            &[
                address_word(group),
                bits_to_set,
                bits_to_wait_for,
                timeout_occurred as u32,
            ],
        );
    }

    #[inline]
    pub fn event_group_wait_bits_block<G>(&self, group: Option<&G>, bits_to_wait_for: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupWaitBitsBlock,
            &[address_word(group), bits_to_wait_for],
        );
    }

    #[inline]
    pub fn event_group_wait_bits_end<G>(
        &self,
        group: Option<&G>,
        bits_to_wait_for: u32,
        timeout_occurred: bool,
    ) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupWaitBitsEnd,
            &[address_word(group), bits_to_wait_for, timeout_occurred as u32],
        );
    }

    #[inline]
    pub fn event_group_clear_bits<G>(&self, group: Option<&G>, bits_to_clear: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupClearBits,
            &[address_word(group), bits_to_clear],
        );
    }

    #[inline]
    pub fn event_group_clear_bits_from_isr<G>(&self, group: Option<&G>, bits_to_clear: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupClearBitsFromIsr,
            &[address_word(group), bits_to_clear],
        );
    }

    #[inline]
    pub fn event_group_set_bits<G>(&self, group: Option<&G>, bits_to_set: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupSetBits,
            &[address_word(group), bits_to_set],
        );
    }

    #[inline]
    pub fn event_group_set_bits_from_isr<G>(&self, group: Option<&G>, bits_to_set: u32) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupSetBitsFromIsr,
            &[address_word(group), bits_to_set],
        );
    }

    #[inline]
    pub fn event_group_delete<G>(&self, group: Option<&G>) {
        if !self.enabled(FilterClass::Tasks) {
            return;
        }
        self.send(
            FilterClass::Tasks,
            MessageId::EventGroupDelete,
            &[address_word(group)],
        );
    }

    // ---- Stream and message buffers ----

    /// `buffer_kind` values: 0 stream buffer, 1 message buffer,
    /// 2 stream batching buffer.
    #[inline]
    pub fn stream_buffer_create<S>(&self, buffer: Option<&S>, buffer_kind: u32) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferCreate,
            &[address_word(buffer), buffer_kind],
        );
    }

    #[inline]
    pub fn stream_buffer_create_failed(&self, buffer_kind: u32) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferCreateFailed,
            &[buffer_kind],
        );
    }

    #[inline]
    pub fn stream_buffer_create_static_failed(&self, buffer_kind: u32) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferCreateStaticFailed,
            &[buffer_kind],
        );
    }

    #[inline]
    pub fn stream_buffer_delete<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferDelete,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn stream_buffer_reset<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferReset,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn stream_buffer_reset_from_isr<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferResetFromIsr,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn blocking_on_stream_buffer_send<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::BlockingOnStreamBufferSend,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn stream_buffer_send<S>(&self, buffer: Option<&S>, bytes_sent: usize) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferSend,
            &[address_word(buffer), bytes_sent as u32],
        );
    }

    #[inline]
    pub fn stream_buffer_send_failed<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferSendFailed,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn stream_buffer_send_from_isr<S>(&self, buffer: Option<&S>, bytes_sent: usize) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferSendFromIsr,
            &[address_word(buffer), bytes_sent as u32],
        );
    }

    #[inline]
    pub fn blocking_on_stream_buffer_receive<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::BlockingOnStreamBufferReceive,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn stream_buffer_receive<S>(&self, buffer: Option<&S>, received_length: usize) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferReceive,
            &[address_word(buffer), received_length as u32],
        );
    }

    #[inline]
    pub fn stream_buffer_receive_failed<S>(&self, buffer: Option<&S>) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferReceiveFailed,
            &[address_word(buffer)],
        );
    }

    #[inline]
    pub fn stream_buffer_receive_from_isr<S>(&self, buffer: Option<&S>, received_length: usize) {
        if !self.enabled(FilterClass::Streams) {
            return;
        }
        self.send(
            FilterClass::Streams,
            MessageId::StreamBufferReceiveFromIsr,
            &[address_word(buffer), received_length as u32],
        );
    }

    // ---- Interrupt markers ----

    #[inline]
    pub fn isr_enter(&self) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(FilterClass::Expert, MessageId::IsrEnter, &[]);
    }

    #[inline]
    pub fn isr_exit(&self) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(FilterClass::Expert, MessageId::IsrExit, &[]);
    }

    #[inline]
    pub fn isr_exit_to_scheduler(&self) {
        if !self.enabled(FilterClass::Expert) {
            return;
        }
        self.send(FilterClass::Expert, MessageId::IsrExitToScheduler, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassMask, TraceConfig};
    use crate::protocol::FilterAssignment;
    use crate::token::hex_digest;
    use arbitrary_int::u5;
    use std::sync::Mutex;
    use std::vec::Vec;

    struct Named(&'static str);

    impl TraceHandle for Named {
        fn name(&self) -> Option<&str> {
            Some(self.0)
        }
    }

    // Not zero-sized, so borrows have a stable, meaningful address
    struct Anonymous {
        _pad: u8,
    }

    impl TraceHandle for Anonymous {
        fn name(&self) -> Option<&str> {
            None
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Captured {
        message_id: u8,
        filter: u8,
        words: Vec<u32>,
    }

    static CAPTURED: Mutex<Vec<Captured>> = Mutex::new(Vec::new());

    #[unsafe(no_mangle)]
    fn write_trace_message(message_id: u8, filter: u8, words: &[u32]) {
        CAPTURED.lock().unwrap().push(Captured {
            message_id,
            filter,
            words: words.to_vec(),
        });
    }

    /// Runs `f` with exclusive use of the capture sink and returns what it
    /// emitted.
    fn capture(f: impl FnOnce()) -> Vec<Captured> {
        static EXCLUSIVE: Mutex<()> = Mutex::new(());
        let _guard = EXCLUSIVE.lock().unwrap();
        CAPTURED.lock().unwrap().clear();
        f();
        core::mem::take(&mut *CAPTURED.lock().unwrap())
    }

    const ALL: KernelTracer = KernelTracer::new(TraceConfig {
        classes: ClassMask::ALL,
        queue_registry: true,
        filters: FilterAssignment::new(u5::new(0), u5::new(1)),
    });

    #[test]
    fn test_task_switch_emits_name_token() {
        let task = Named("Idle");
        let log = capture(|| ALL.task_switched_in(Some(&task)));
        assert_eq!(
            log,
            [Captured {
                message_id: MessageId::TaskSwitchedIn as u8,
                filter: 0,
                words: std::vec![u32::from_le_bytes(*b"Idle")],
            }]
        );
    }

    #[test]
    fn test_null_task_emits_null_sentinel() {
        let log = capture(|| ALL.task_switched_in::<Named>(None));
        assert_eq!(log[0].words, [u32::from_le_bytes(*b"NULL")]);
    }

    #[test]
    fn test_disabled_class_emits_nothing() {
        let basic_only = KernelTracer::new(TraceConfig::DEFAULT);
        let timer = Named("Tmr1");
        let log = capture(|| {
            basic_only.timer_create(Some(&timer), 100);
            basic_only.malloc(0x2000_0000, 64);
            basic_only.isr_enter();
            basic_only.task_delay(10);
        });
        // Only the Basic-class message survives
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message_id, MessageId::TaskDelay as u8);
    }

    #[test]
    fn test_queue_receive_packs_and_saturates() {
        let queue = Named("RxQ");
        let log = capture(|| ALL.queue_receive(Some(&queue), 0x0002_0001, 3));
        assert_eq!(
            log[0].words,
            [u32::from_le_bytes(*b"RxQ\0"), 0x0003_FFFF]
        );
    }

    #[test]
    fn test_queue_send_failed_packs_ticks_and_position() {
        let queue = Named("TxQ");
        let log = capture(|| ALL.queue_send_failed(Some(&queue), 0x2000_0000, 2));
        assert_eq!(log[0].words[1], 0x2FFF_FFFF);
    }

    #[test]
    fn test_unnamed_queue_falls_back_to_address_digest() {
        let queue = Anonymous { _pad: 0 };
        let expected = hex_digest((&queue as *const Anonymous as usize & 0xFFFF) as u16);
        let log = capture(|| ALL.queue_delete(Some(&queue)));
        assert_eq!(log[0].words, [expected.raw()]);
    }

    #[test]
    fn test_disabled_registry_uses_unknown_sentinel() {
        let no_registry = KernelTracer::new(TraceConfig {
            classes: ClassMask::ALL,
            queue_registry: false,
            filters: FilterAssignment::new(u5::new(0), u5::new(1)),
        });
        // Even a named queue must not be consulted
        let queue = Named("RxQ");
        let log = capture(|| no_registry.queue_delete(Some(&queue)));
        assert_eq!(log[0].words, [0x3F3F_3F3F]);
    }

    #[test]
    fn test_notify_packs_index_and_action() {
        let task = Named("Work");
        let log = capture(|| ALL.task_notify(Some(&task), 5, 2, 0xAABB_CCDD));
        assert_eq!(
            log[0].words,
            [u32::from_le_bytes(*b"Work"), 0x0002_0005, 0xAABB_CCDD]
        );
    }

    #[test]
    fn test_notify_take_sets_clear_flag() {
        let task = Named("Work");
        let log = capture(|| ALL.task_notify_take(Some(&task), 1, true, 50));
        assert_eq!(log[0].words[1], 0x0001_0001);
        assert_eq!(log[0].words[2], 50);
    }

    #[test]
    fn test_notify_wait_saturates_long_waits() {
        let task = Named("Work");
        let log = capture(|| ALL.task_notify_wait(Some(&task), 2, 0x0100_0000, 0xF, 0xF0));
        // index in the low byte, saturated ticks above it
        assert_eq!(log[0].words[1], 0xFFFF_FF02);
        assert_eq!(log[0].words[2..], [0xF, 0xF0]);
    }

    #[test]
    fn test_filter_fallback_reaches_the_wire() {
        let timer = Named("Tmr1");
        let log = capture(|| {
            ALL.timer_expired(Some(&timer));
            ALL.malloc(0x1000, 32);
        });
        // Timer falls back to the Tasks filter, Malloc to the Basic filter
        assert_eq!(log[0].filter, 1);
        assert_eq!(log[1].filter, 0);
    }

    #[test]
    fn test_queue_registry_add_records_address_and_name() {
        let queue = Anonymous { _pad: 0 };
        let log = capture(|| ALL.queue_registry_add(Some(&queue), "RxQ"));
        assert_eq!(
            log[0].words,
            [
                &queue as *const Anonymous as usize as u32,
                u32::from_le_bytes(*b"RxQ\0"),
            ]
        );
    }

    #[test]
    fn test_marker_messages_carry_no_words() {
        let log = capture(|| {
            ALL.isr_enter();
            ALL.isr_exit_to_scheduler();
            ALL.low_power_idle_begin();
            ALL.starting_scheduler();
        });
        assert_eq!(log.len(), 4);
        assert!(log.iter().all(|m| m.words.is_empty()));
    }

    #[test]
    fn test_stream_buffer_words() {
        let buffer = 0u64;
        let log = capture(|| ALL.stream_buffer_send(Some(&buffer), 128));
        assert_eq!(
            log[0].words,
            [&buffer as *const u64 as usize as u32, 128]
        );
    }

    #[test]
    fn test_event_group_sync_end_flags_timeout() {
        let group = 0u32;
        let log = capture(|| ALL.event_group_sync_end(Some(&group), 0x3, 0x7, true));
        assert_eq!(log[0].words[1..], [0x3, 0x7, 1]);
    }
}
