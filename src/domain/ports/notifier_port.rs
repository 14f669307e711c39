/// Port for desktop notifications.
#[cfg_attr(test, mockall::automock)]
pub trait DesktopNotifierPort: Send + Sync {
    /// Shows a desktop notification.
    fn send(&self, title: &str, body: &str);
}
