//! Уведомления (toast) о результатах взаимодействий.

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Уровень уведомления.
pub enum NotificationLevel {
    /// Операция прошла успешно.
    Success,
    /// Операция не удалась.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Короткое временное сообщение для пользователя (toast).
pub struct Notification {
    /// Уровень.
    pub level: NotificationLevel,
    /// Текст.
    pub message: String,
}

impl Notification {
    /// Уведомление об успехе.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Уведомление об ошибке.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Является ли уведомление ошибкой.
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Получатель уведомлений контроллера. Отрисовку выполняет вызывающая сторона.
pub trait Notifier: Send + Sync {
    /// Доставляет уведомление. Не должен блокировать.
    fn notify(&self, notification: Notification);
}

#[derive(Debug, Clone, Copy, Default)]
/// Пишет уведомления в лог через `tracing`.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(message = %notification.message, "notification"),
            NotificationLevel::Error => warn!(message = %notification.message, "notification"),
        }
    }
}

#[derive(Debug, Clone)]
/// Пересылает уведомления в канал; читатель канала их отображает.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Создаёт нотификатор и принимающую сторону канала.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // receiver dropped: nobody renders toasts anymore
        if self.tx.send(notification).is_err() {
            warn!("notification receiver is closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notification::success("a"));
        notifier.notify(Notification::error("b"));

        assert_eq!(rx.try_recv().ok(), Some(Notification::success("a")));
        let second = rx.try_recv().expect("second notification");
        assert!(second.is_error());
        assert_eq!(second.message, "b");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify(Notification::error("lost"));
    }
}
