/// Per-conversation state threaded through every invocation.
///
/// The session owns exactly one of these for the life of the process and lends
/// it out as `&mut` to the runner, which in turn lends it to tools. Nothing
/// else holds on to it between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = Some(city.into());
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.first_name(), None);
        assert_eq!(ctx.city(), None);
        assert_eq!(ctx.last_name, None);
    }

    #[test]
    fn builder_sets_names() {
        let ctx = SessionContext::new()
            .with_first_name("James")
            .with_last_name("Holden");
        assert_eq!(ctx.first_name(), Some("James"));
        assert_eq!(ctx.last_name.as_deref(), Some("Holden"));
    }

    #[test]
    fn set_city_overwrites() {
        let mut ctx = SessionContext::new();
        ctx.set_city("Paris");
        ctx.set_city("Tokyo");
        assert_eq!(ctx.city(), Some("Tokyo"));
    }
}
