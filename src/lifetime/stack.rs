//! Ordered activation stack.

/// Ordered sequence of app ids; the last element is the current app.
///
/// An id appears at most once: pushing an id already on the stack moves it to the top.
///
/// ```
/// use skillvisor::ActivationStack;
///
/// let mut stack = ActivationStack::default();
/// stack.push_top("a");
/// stack.push_top("b");
/// stack.push_top("a");
/// assert_eq!(stack.as_slice(), ["b", "a"]);
/// assert_eq!(stack.top(), Some("a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationStack {
    apps: Vec<String>,
}

impl ActivationStack {
    pub fn top(&self) -> Option<&str> {
        self.apps.last().map(String::as_str)
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.apps.iter().any(|a| a == app_id)
    }

    /// Moves (or inserts) `app_id` to the top.
    pub fn push_top(&mut self, app_id: &str) {
        self.remove(app_id);
        self.apps.push(app_id.to_string());
    }

    /// Removes `app_id`; returns whether it was on the stack.
    pub fn remove(&mut self, app_id: &str) -> bool {
        let before = self.apps.len();
        self.apps.retain(|a| a != app_id);
        before != self.apps.len()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Bottom-to-top view.
    pub fn as_slice(&self) -> &[String] {
        &self.apps
    }
}
