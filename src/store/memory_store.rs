use std::sync::Mutex;

use super::TokenStore;

/// Keeps the token for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`, as if left over from an earlier run.
    pub fn with_token(token: impl Into<String>) -> Self {
        MemoryStore {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryStore {
    fn save(&self, token: &str) -> Result<(), String> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| "token store mutex poisoned".to_string())?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, String> {
        let slot = self
            .token
            .lock()
            .map_err(|_| "token store mutex poisoned".to_string())?;
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<(), String> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| "token store mutex poisoned".to_string())?;
        *slot = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_overwrites_previous_token() {
        let store = MemoryStore::with_token("old");
        store.save("new").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = MemoryStore::new();
        store.clear().unwrap();
        store.save("t").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
