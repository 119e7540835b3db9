//! Оптимистичные взаимодействия с постом: лайк, закладка, комментарий,
//! правка и удаление.
//!
//! [`PostInteractions`] применяет изменение к локальной копии состояния до
//! ответа сервера, затем фиксирует его или откатывает и сообщает результат
//! через [`Notifier`].

mod controller;
pub mod notify;
mod state;

pub use controller::{Capabilities, InteractionError, Outcome, PostInteractions};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use state::{InFlight, InteractionKind, InteractionSnapshot, MutationPhase};
