//! Named actions dispatched by id.
//!
//! Menus, key bindings and the command palette refer to actions by string id.
//! Dispatching an id that was never registered is a programming error and
//! fails loudly instead of doing nothing.

use crate::error::{Error, Result};
use log::debug;
use parking_lot::Mutex;

type Handler<C> = Box<dyn Fn(&mut C) -> Result<()> + Send + Sync>;

/// A registered action.
pub struct Action<C> {
    pub id: String,
    pub label: String,
    handler: Handler<C>,
}

/// Registry of actions operating on a context `C`.
pub struct ActionRegistry<C> {
    actions: Vec<Action<C>>,
    /// Most recently executed ids, newest first
    history: Mutex<Vec<String>>,
}

impl<C> ActionRegistry<C> {
    /// Maximum number of ids kept in the usage history
    const MAX_HISTORY_SIZE: usize = 50;

    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Register an action, replacing any action with the same id.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut C) -> Result<()> + Send + Sync + 'static,
    ) {
        let id = id.into();
        self.actions.retain(|a| a.id != id);
        self.actions.push(Action {
            id,
            label: label.into(),
            handler: Box::new(handler),
        });
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.id != id);
        self.actions.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actions.iter().any(|a| a.id == id)
    }

    /// `(id, label)` of every action, in registration order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.actions
            .iter()
            .map(|a| (a.id.as_str(), a.label.as_str()))
            .collect()
    }

    /// Run the action `id` against `ctx`.
    ///
    /// Unknown ids fail with [`Error::UnknownAction`].
    pub fn execute(&self, id: &str, ctx: &mut C) -> Result<()> {
        let action = self
            .actions
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::UnknownAction(id.to_string()))?;
        debug!("Executing action {}", id);
        self.record_usage(id);
        (action.handler)(ctx)
    }

    fn record_usage(&self, id: &str) {
        let mut history = self.history.lock();
        history.retain(|name| name != id);
        history.insert(0, id.to_string());
        history.truncate(Self::MAX_HISTORY_SIZE);
    }

    /// Recently executed ids, newest first.
    pub fn recent(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl<C> Default for ActionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
