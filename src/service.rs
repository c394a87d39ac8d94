//! Chat service façade.
//!
//! Holds the currently active adapter and delegates `send`/`stream` to it.
//! `configure` is the only mutator: it resolves registry → factory → adapter
//! and replaces the active pair atomically. A call that is already in flight
//! keeps the adapter it cloned out at entry, so a concurrent re-configure
//! changes which adapter *subsequent* calls use without cancelling anything.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::error::LlmError;
use crate::registry::ProviderRegistry;
use crate::traits::ChatStrategy;
use crate::types::{ChatOptions, ChatResponse, ChatStream, ProviderSelection};

struct ActiveProvider {
    adapter: Arc<dyn ChatStrategy>,
    selection: ProviderSelection,
}

/// Façade over the currently selected backend adapter.
pub struct ChatService {
    registry: Arc<ProviderRegistry>,
    active: RwLock<Option<ActiveProvider>>,
}

impl ChatService {
    /// Create an unconfigured service over an explicit registry.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            active: RwLock::new(None),
        }
    }

    /// Create an unconfigured service over the global registry.
    pub fn with_global_registry() -> Self {
        Self::new(crate::registry::global())
    }

    /// Resolve `selection` through the registry and make it active.
    ///
    /// Replaces both the active adapter and the active selection in one
    /// step. Fails with [`LlmError::NotRegistered`] or
    /// [`LlmError::UnsupportedModel`] without touching the current state.
    pub fn configure(&self, selection: ProviderSelection) -> Result<(), LlmError> {
        let factory = self.registry.get_factory(&selection.platform)?;
        let adapter = factory.create_client(&selection.model)?;
        tracing::info!(
            platform = %selection.platform,
            model = %selection.model,
            "chat service configured"
        );
        *self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(ActiveProvider { adapter, selection });
        Ok(())
    }

    // The slot is only ever replaced wholesale, so a guard recovered from a
    // poisoned lock still holds a consistent value.
    fn read_active(&self) -> RwLockReadGuard<'_, Option<ActiveProvider>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last-applied selection, or `None` if never configured.
    pub fn current_selection(&self) -> Option<ProviderSelection> {
        self.read_active()
            .as_ref()
            .map(|active| active.selection.clone())
    }

    // Clone the adapter handle out of the lock so the await below is bound
    // to the adapter that was active at call entry.
    fn active_adapter(&self) -> Result<Arc<dyn ChatStrategy>, LlmError> {
        self.read_active()
            .as_ref()
            .map(|active| active.adapter.clone())
            .ok_or(LlmError::NotConfigured)
    }

    /// Send a single-shot message through the active adapter.
    pub async fn send(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        let adapter = self.active_adapter()?;
        adapter.send_message(prompt, options).await
    }

    /// Stream a message through the active adapter, forwarding the produced
    /// sequence unmodified.
    pub async fn stream(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        let adapter = self.active_adapter()?;
        adapter.stream_message(prompt, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ChatService {
        ChatService::new(Arc::new(ProviderRegistry::with_builtin_providers()))
    }

    #[tokio::test]
    async fn test_send_before_configure_fails() {
        let service = service();
        let err = service.send("hi", &ChatOptions::new()).await.unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
        assert!(service.current_selection().is_none());
    }

    #[tokio::test]
    async fn test_stream_before_configure_fails() {
        let service = service();
        let err = service.stream("hi", &ChatOptions::new()).await.unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    #[tokio::test]
    async fn test_configure_then_send() {
        let service = service();
        service
            .configure(ProviderSelection::new("ollama", "llama3"))
            .unwrap();

        let response = service.send("hello", &ChatOptions::new()).await.unwrap();
        assert_eq!(response.model, "llama3");
        assert_eq!(
            service.current_selection().unwrap(),
            ProviderSelection::new("ollama", "llama3")
        );
    }

    #[tokio::test]
    async fn test_reconfigure_switches_backend() {
        let service = service();
        service
            .configure(ProviderSelection::new("ollama", "llama3"))
            .unwrap();
        service
            .configure(ProviderSelection::new("azure", "gpt-4o"))
            .unwrap();

        let response = service.send("hello", &ChatOptions::new()).await.unwrap();
        assert_eq!(response.model, "gpt-4o");
    }

    #[test]
    fn test_failed_configure_keeps_prior_state() {
        let service = service();
        service
            .configure(ProviderSelection::new("google", "gemini-pro"))
            .unwrap();

        let err = service
            .configure(ProviderSelection::new("google", "unknown"))
            .unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedModel { .. }));
        assert_eq!(
            service.current_selection().unwrap(),
            ProviderSelection::new("google", "gemini-pro")
        );
    }

    #[tokio::test]
    async fn test_send_survives_poisoned_lock() {
        let service = Arc::new(service());
        service
            .configure(ProviderSelection::new("ollama", "llama3"))
            .unwrap();

        let poisoner = Arc::clone(&service);
        std::thread::spawn(move || {
            let _guard = poisoner.active.write().unwrap();
            panic!("poisoning the service lock");
        })
        .join()
        .unwrap_err();

        let response = service.send("hi", &ChatOptions::new()).await.unwrap();
        assert_eq!(response.model, "llama3");
        assert!(service.current_selection().is_some());
    }

    #[test]
    fn test_configure_unknown_platform() {
        let service = service();
        let err = service
            .configure(ProviderSelection::new("openrouter", "gpt-4o"))
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::NotRegistered { platform } if platform == "openrouter"
        ));
    }
}
