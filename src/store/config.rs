/// Construction options for a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Label used in logs and errors. Falls back to `"store"` for plain
    /// stores and `"composed"` for composed ones.
    pub name: Option<String>,
}

impl StoreConfig {
    /// Options with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub(crate) fn name_or(&self, fallback: &str) -> String {
        self.name.clone().unwrap_or_else(|| fallback.to_string())
    }
}
