//! Desktop notifications with conditional compilation.

use crate::domain::ports::DesktopNotifierPort;

#[cfg(feature = "notify")]
mod notify_impl {
    use super::DesktopNotifierPort;
    use notify_rust::Notification;

    /// Shows album events through the platform notification daemon.
    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotifier {
        enabled: bool,
    }

    impl DesktopNotifier {
        #[must_use]
        pub const fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        #[must_use]
        pub const fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    impl DesktopNotifierPort for DesktopNotifier {
        fn send(&self, title: &str, body: &str) {
            if !self.enabled {
                return;
            }

            let title = title.to_string();
            let body = body.to_string();

            tokio::task::spawn_blocking(move || {
                if let Err(e) = Notification::new()
                    .summary(&title)
                    .body(&body)
                    .appname("albumwire")
                    .show()
                {
                    tracing::warn!(error = %e, "Failed to show desktop notification");
                }
            });
        }
    }
}

#[cfg(not(feature = "notify"))]
mod stub_impl {
    use super::DesktopNotifierPort;

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotifier;

    impl DesktopNotifier {
        #[must_use]
        pub const fn new(_enabled: bool) -> Self {
            Self
        }

        #[must_use]
        pub const fn is_enabled(&self) -> bool {
            false
        }
    }

    impl DesktopNotifierPort for DesktopNotifier {
        fn send(&self, title: &str, _body: &str) {
            tracing::trace!(title, "Desktop notifications not compiled in");
        }
    }
}

#[cfg(feature = "notify")]
pub use notify_impl::DesktopNotifier;
#[cfg(not(feature = "notify"))]
pub use stub_impl::DesktopNotifier;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier_is_silent() {
        let notifier = DesktopNotifier::new(false);

        notifier.send("Album created", "Meteora");

        assert!(!notifier.is_enabled());
    }
}
