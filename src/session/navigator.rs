use tracing::info;

/// Side effect fired when the session store signs the user out.
///
/// A UI shell implements this to switch routes; headless callers can just log.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        info!(
            event_name = "session.navigate",
            event_domain = "session",
            route,
            "Redirecting to {}",
            route
        );
    }
}
