//! The `Context` owns every piece of state belonging to one simulation run.
//!
//! Modules never keep global state. Instead they register a *data plugin* with
//! `define_data_plugin!`, and the `Context` lazily creates the plugin's data container the first
//! time it is requested. Work is expressed as *plans*: closures scheduled at a simulated time
//! (one day = 1.0). Modules communicate through typed *events*; handlers subscribed with
//! `subscribe_to_event` are run as queued callbacks after the code that emitted the event.
//!
//! Because a `Context` owns its population, its random number generators and its report
//! writers, two runs never share mutable state. Run independent trials by building independent
//! contexts.
use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, trace};

use crate::plan::{ExecutionPhase, PlanQueue};
use crate::{HashMap, HashMapExt};

/// A trait for types that provide a data container to be held by `Context`. Use
/// `define_data_plugin!` rather than implementing it by hand.
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in `Context`.
///
/// ```
/// use concert_contagion::{define_data_plugin, Context};
///
/// define_data_plugin!(CounterPlugin, usize, 0);
///
/// let mut context = Context::new();
/// *context.get_data_container_mut(CounterPlugin) += 1;
/// assert_eq!(context.get_data_container(CounterPlugin), Some(&1));
/// ```
#[macro_export]
macro_rules! define_data_plugin {
    ($data_plugin:ident, $data_container:ty, $default:expr) => {
        #[derive(Copy, Clone)]
        struct $data_plugin;

        impl $crate::context::DataPlugin for $data_plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

/// Marker trait for events that can be emitted through `Context::emit_event`.
pub trait SimEvent: Copy + 'static {}

type Callback = dyn FnOnce(&mut Context);
type EventHandler<E> = dyn Fn(&mut Context, E);

pub struct Context {
    plan_queue: PlanQueue<Box<Callback>>,
    callback_queue: VecDeque<Box<Callback>>,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    event_handlers: HashMap<TypeId, Box<dyn Any>>,
    current_time: f64,
    shutdown_requested: bool,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            plan_queue: PlanQueue::new(),
            callback_queue: VecDeque::new(),
            data_plugins: HashMap::new(),
            event_handlers: HashMap::new(),
            current_time: 0.0,
            shutdown_requested: false,
        }
    }

    /// Schedules `callback` to run at `time` in the `Normal` phase.
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN, infinite or earlier than the current time.
    pub fn add_plan(&mut self, time: f64, callback: impl FnOnce(&mut Context) + 'static) {
        self.add_plan_with_phase(time, callback, ExecutionPhase::Normal)
    }

    /// Schedules `callback` to run at `time` in the given phase.
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN, infinite or earlier than the current time.
    pub fn add_plan_with_phase(
        &mut self,
        time: f64,
        callback: impl FnOnce(&mut Context) + 'static,
        phase: ExecutionPhase,
    ) {
        assert!(
            !(time.is_nan() || time.is_infinite() || time < self.current_time),
            "Time {time} is invalid"
        );
        self.plan_queue.add_plan(time, Box::new(callback), phase);
    }

    /// Runs `callback` as soon as the currently executing plan or callback returns.
    pub fn queue_callback(&mut self, callback: impl FnOnce(&mut Context) + 'static) {
        self.callback_queue.push_back(Box::new(callback));
    }

    /// Registers `handler` to be called for every event of type `E`.
    pub fn subscribe_to_event<E: SimEvent>(&mut self, handler: impl Fn(&mut Context, E) + 'static) {
        let handler_vec = self
            .event_handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<Rc<EventHandler<E>>>::new()) as Box<dyn Any>);
        let handler_vec: &mut Vec<Rc<EventHandler<E>>> = handler_vec.downcast_mut().unwrap();
        handler_vec.push(Rc::new(handler));
    }

    /// Emits `event`; each subscribed handler is queued as a callback.
    pub fn emit_event<E: SimEvent>(&mut self, event: E) {
        let Context {
            event_handlers,
            callback_queue,
            ..
        } = self;
        if let Some(handler_vec) = event_handlers.get(&TypeId::of::<E>()) {
            let handler_vec: &Vec<Rc<EventHandler<E>>> = handler_vec.downcast_ref().unwrap();
            for handler in handler_vec {
                let handler_clone = Rc::clone(handler);
                callback_queue.push_back(Box::new(move |context| handler_clone(context, event)));
            }
        }
    }

    /// Returns a mutable reference to the data container of `plugin`, creating it if it
    /// doesn't exist yet.
    #[allow(clippy::missing_panics_doc)]
    pub fn get_data_container_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create_data_container()))
            .downcast_mut::<T::DataContainer>()
            .unwrap() // Will never panic as the container was created for this type
    }

    /// Returns the data container of `plugin` if it was created already.
    #[must_use]
    pub fn get_data_container<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    #[must_use]
    pub fn get_current_time(&self) -> f64 {
        self.current_time
    }

    /// Stops `execute` after the current plan; remaining plans are dropped.
    pub fn shutdown(&mut self) {
        debug!("shutdown requested at t={}", self.current_time);
        self.shutdown_requested = true;
    }

    /// Runs queued callbacks and plans in order until there is nothing left to do or
    /// `shutdown` was called.
    pub fn execute(&mut self) {
        trace!(
            "executing context with {} plans",
            self.plan_queue.remaining_plan_count()
        );
        loop {
            if self.shutdown_requested {
                self.shutdown_requested = false;
                self.plan_queue.clear();
                self.callback_queue.clear();
                break;
            }

            // Callbacks run before the next plan.
            if let Some(callback) = self.callback_queue.pop_front() {
                callback(self);
                continue;
            }

            match self.plan_queue.get_next_plan() {
                Some(plan) => {
                    self.current_time = plan.time;
                    (plan.data)(self);
                }
                None => break,
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    define_data_plugin!(ComponentA, Vec<u32>, vec![]);

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Ping(u32);
    impl SimEvent for Ping {}

    fn add_plan(context: &mut Context, time: f64, value: u32) {
        context.add_plan(time, move |context| {
            context.get_data_container_mut(ComponentA).push(value);
        });
    }

    #[test]
    #[should_panic(expected = "Time -1 is invalid")]
    fn negative_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, -1.0, 0);
    }

    #[test]
    #[should_panic(expected = "is invalid")]
    fn nan_plan_time() {
        let mut context = Context::new();
        add_plan(&mut context, f64::NAN, 0);
    }

    #[test]
    fn empty_context() {
        let mut context = Context::new();
        context.execute();
        assert_eq!(context.get_current_time(), 0.0);
        assert!(context.get_data_container(ComponentA).is_none());
    }

    #[test]
    fn plans_advance_time() {
        let mut context = Context::new();
        add_plan(&mut context, 2.0, 2);
        add_plan(&mut context, 1.0, 1);
        context.execute();
        assert_eq!(context.get_current_time(), 2.0);
        assert_eq!(*context.get_data_container_mut(ComponentA), vec![1, 2]);
    }

    #[test]
    fn callbacks_run_before_next_plan() {
        let mut context = Context::new();
        context.add_plan(1.0, |context| {
            context.get_data_container_mut(ComponentA).push(1);
            add_plan(context, 2.0, 3);
            context.queue_callback(|context| {
                context.get_data_container_mut(ComponentA).push(2);
            });
        });
        context.execute();
        assert_eq!(*context.get_data_container_mut(ComponentA), vec![1, 2, 3]);
    }

    #[test]
    fn last_phase_runs_after_normal() {
        let mut context = Context::new();
        context.add_plan_with_phase(
            1.0,
            |context| context.get_data_container_mut(ComponentA).push(2),
            ExecutionPhase::Last,
        );
        add_plan(&mut context, 1.0, 1);
        context.execute();
        assert_eq!(*context.get_data_container_mut(ComponentA), vec![1, 2]);
    }

    #[test]
    fn shutdown_drops_remaining_plans() {
        let mut context = Context::new();
        add_plan(&mut context, 1.0, 1);
        context.add_plan(1.5, Context::shutdown);
        add_plan(&mut context, 2.0, 2);
        context.execute();
        assert_eq!(context.get_current_time(), 1.5);
        assert_eq!(*context.get_data_container_mut(ComponentA), vec![1]);
    }

    #[test]
    fn events_reach_every_subscriber_in_order() {
        let mut context = Context::new();
        context.subscribe_to_event(|context, event: Ping| {
            context.get_data_container_mut(ComponentA).push(event.0);
        });
        context.subscribe_to_event(|context, event: Ping| {
            context.get_data_container_mut(ComponentA).push(event.0 * 10);
        });
        context.add_plan(1.0, |context| {
            context.emit_event(Ping(1));
            context.emit_event(Ping(2));
        });
        context.execute();
        assert_eq!(
            *context.get_data_container_mut(ComponentA),
            vec![1, 10, 2, 20]
        );
    }

    #[test]
    fn events_without_subscribers_are_dropped() {
        let mut context = Context::new();
        context.emit_event(Ping(7));
        context.execute();
        assert!(context.get_data_container(ComponentA).is_none());
    }
}
