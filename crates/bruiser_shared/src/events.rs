//! Notification payloads delivered by the host.
//!
//! The host owns delivery. Handlers receive these by reference and answer
//! with an [`EventControl`].

use crate::ids::{FormId, RefId};

/// What a handler tells the dispatcher after processing a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventControl {
    /// Keep delivering to the next sink.
    #[default]
    Continue,
    /// Stop delivering this notification to later sinks.
    Stop,
}

/// An animation graph tag fired on an actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationEvent {
    /// Raw animation tag, e.g. `AttackWinStartLeft`.
    pub tag: String,
    /// Actor whose graph fired the tag.
    pub holder: RefId,
}

impl AnimationEvent {
    /// Creates an animation event.
    #[must_use]
    pub fn new(tag: impl Into<String>, holder: RefId) -> Self {
        Self {
            tag: tag.into(),
            holder,
        }
    }
}

/// A hit landed by something on something.
///
/// Any field the host could not fill in is `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitEvent {
    /// Who attacked.
    pub cause: Option<RefId>,
    /// What was hit. Not necessarily an actor.
    pub target: Option<RefId>,
    /// Form that dealt the hit (weapon, spell...).
    pub source: FormId,
}

impl HitEvent {
    /// Creates a fully populated hit event.
    #[must_use]
    pub const fn new(cause: RefId, target: RefId, source: FormId) -> Self {
        Self {
            cause: Some(cause),
            target: Some(target),
            source,
        }
    }
}

/// A menu opened or closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuOpenCloseEvent {
    /// Menu name, e.g. `RaceSex Menu`.
    pub menu_name: String,
    /// `true` when opening, `false` when closing.
    pub opening: bool,
}

impl MenuOpenCloseEvent {
    /// A menu close notification.
    #[must_use]
    pub fn closed(menu_name: impl Into<String>) -> Self {
        Self {
            menu_name: menu_name.into(),
            opening: false,
        }
    }

    /// A menu open notification.
    #[must_use]
    pub fn opened(menu_name: impl Into<String>) -> Self {
        Self {
            menu_name: menu_name.into(),
            opening: true,
        }
    }
}

/// Host lifecycle messages driving registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleMessage {
    /// All data files are loaded. Forms can be resolved.
    DataLoaded,
    /// A save finished loading.
    PostLoadGame,
    /// A new game was started.
    NewGame,
}
