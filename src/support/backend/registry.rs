use super::{backend_type_id, Backend};
use log::trace;
use std::{any::TypeId, collections::HashMap};

type StartCallback<A> = Box<dyn FnMut(&A, &mut dyn Backend) -> bool>;
type StopCallback<A> = Box<dyn FnMut(&A, &mut dyn Backend)>;

struct Callbacks<A> {
    start: Option<StartCallback<A>>,
    stop: Option<StopCallback<A>>,
}

impl<A> Default for Callbacks<A> {
    fn default() -> Self {
        Self {
            start: None,
            stop: None,
        }
    }
}

/// Start and stop callbacks of an application, one pair per backend type.
///
/// The application is passed back into every callback by reference, which
/// lets callbacks read window state without holding on to it.
pub struct BackendRegistry<A> {
    callbacks: HashMap<TypeId, Callbacks<A>>,
}

impl<A> Default for BackendRegistry<A> {
    fn default() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }
}

impl<A: 'static> BackendRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the callback run when a backend of type `B` is started.
    /// Returning `false` from it marks the start as failed. Registering again
    /// replaces the previous callback.
    pub fn on_backend_start<B, F>(&mut self, mut callback: F)
    where
        B: Backend,
        F: FnMut(&A, &mut B) -> bool + 'static,
    {
        trace!("Registering start callback for backend type {:?}", TypeId::of::<B>());
        self.entry::<B>().start = Some(Box::new(move |app: &A, backend: &mut dyn Backend| {
            match backend.as_any_mut().downcast_mut::<B>() {
                Some(backend) => callback(app, backend),
                None => false,
            }
        }));
    }

    pub fn on_backend_stop<B, F>(&mut self, mut callback: F)
    where
        B: Backend,
        F: FnMut(&A, &mut B) + 'static,
    {
        trace!("Registering stop callback for backend type {:?}", TypeId::of::<B>());
        self.entry::<B>().stop = Some(Box::new(move |app: &A, backend: &mut dyn Backend| {
            if let Some(backend) = backend.as_any_mut().downcast_mut::<B>() {
                callback(app, backend);
            }
        }));
    }

    /// Runs the start callback registered for the backend's type.
    ///
    /// Returns `None` when no start callback is registered, otherwise whether
    /// the callback reported success.
    pub fn start(&mut self, app: &A, backend: &mut dyn Backend) -> Option<bool> {
        let callbacks = self.callbacks.get_mut(&backend_type_id(backend))?;
        let start = callbacks.start.as_mut()?;
        Some(start(app, backend))
    }

    /// Runs the stop callback registered for the backend's type, returning
    /// whether one was registered.
    pub fn stop(&mut self, app: &A, backend: &mut dyn Backend) -> bool {
        let stop = self
            .callbacks
            .get_mut(&backend_type_id(backend))
            .and_then(|callbacks| callbacks.stop.as_mut());

        match stop {
            Some(stop) => {
                stop(app, backend);
                true
            }
            None => false,
        }
    }

    pub fn has_start<B: Backend>(&self) -> bool {
        self.callbacks
            .get(&TypeId::of::<B>())
            .map_or(false, |callbacks| callbacks.start.is_some())
    }

    pub fn has_stop<B: Backend>(&self) -> bool {
        self.callbacks
            .get(&TypeId::of::<B>())
            .map_or(false, |callbacks| callbacks.stop.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn entry<B: Backend>(&mut self) -> &mut Callbacks<A> {
        self.callbacks.entry(TypeId::of::<B>()).or_default()
    }
}
