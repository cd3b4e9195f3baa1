//! Storage context
//!
//! Holds the injected device, the settings and the scratch pair, and enforces
//! the init state machine shared by all three layers.

use tracing::{debug, error};

use crate::config::StorageSettings;
use crate::device::PageDevice;
use crate::error::{ErrorKind, Layer, Result, StorError};
use crate::page::ScratchPair;

/// Layer-specific settings rules, checked at init and on every call
pub(crate) type SettingsRules = fn(&StorageSettings) -> Result<()>;

/// Lifecycle of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtxState {
    Uninitialized,
    Initialized,
    /// A structural invariant broke after init; only a new init clears it
    CorruptDetected,
}

/// Disjoint borrows handed to an operation after the coherence check
pub(crate) struct Parts<'c, 'buf, D> {
    pub device: &'c mut D,
    pub scratch: &'c mut ScratchPair<'buf>,
    pub settings: &'c StorageSettings,
}

pub struct Context<'buf, D> {
    state: CtxState,
    device: Option<D>,
    settings: StorageSettings,
    scratch: Option<ScratchPair<'buf>>,
    rules: SettingsRules,
}

impl<'buf, D: PageDevice> Default for Context<'buf, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'buf, D: PageDevice> Context<'buf, D> {
    /// An uninitialized context
    pub fn new() -> Self {
        Self {
            state: CtxState::Uninitialized,
            device: None,
            settings: StorageSettings::default(),
            scratch: None,
            rules: StorageSettings::validate,
        }
    }

    /// Validate everything and move to `Initialized`.
    ///
    /// On failure the context is left `Uninitialized`.
    pub(crate) fn init(
        &mut self,
        device: D,
        settings: StorageSettings,
        region: &'buf mut [u8],
        rules: SettingsRules,
    ) -> Result<()> {
        self.state = CtxState::Uninitialized;
        self.device = None;
        self.scratch = None;

        if region.is_empty() {
            return Err(StorError::new(
                Layer::Low,
                ErrorKind::BadPointer("scratch region is empty"),
            ));
        }
        rules(&settings)?;
        let scratch = ScratchPair::split(region, settings.page_length)?;

        self.device = Some(device);
        self.settings = settings;
        self.scratch = Some(scratch);
        self.rules = rules;
        self.state = CtxState::Initialized;

        debug!(
            total_pages = settings.total_pages,
            page_length = settings.page_length,
            retries = settings.rw_retry_count,
            "storage context initialized"
        );
        Ok(())
    }

    pub fn state(&self) -> CtxState {
        self.state
    }

    pub fn is_init(&self) -> bool {
        self.state == CtxState::Initialized
    }

    /// Settings of an initialized context
    pub fn settings(&self) -> Result<&StorageSettings> {
        self.check_state()?;
        Ok(&self.settings)
    }

    /// The injected device, if any (fault injection, inspection)
    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.device.as_mut()
    }

    /// Tear the context down and hand the device and buffers back
    pub fn release(self) -> Option<(D, &'buf mut [u8], &'buf mut [u8])> {
        let device = self.device?;
        let (a, b) = self.scratch?.into_inner();
        Some((device, a, b))
    }

    /// State check followed by the structural coherence check
    pub(crate) fn parts(&mut self) -> Result<Parts<'_, 'buf, D>> {
        self.check_state()?;

        if let Err(reason) = self.coherence() {
            error!(%reason, "storage context corrupted");
            self.state = CtxState::CorruptDetected;
            return Err(StorError::new(Layer::Low, ErrorKind::CorruptCtx(reason)));
        }

        match (self.device.as_mut(), self.scratch.as_mut()) {
            (Some(device), Some(scratch)) => Ok(Parts {
                device,
                scratch,
                settings: &self.settings,
            }),
            _ => Err(StorError::new(
                Layer::Low,
                ErrorKind::CorruptCtx("device or scratch missing".to_string()),
            )),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_state(&self) -> Result<()> {
        match self.state {
            CtxState::Initialized => Ok(()),
            CtxState::Uninitialized => Err(StorError::new(Layer::Low, ErrorKind::NoInit)),
            CtxState::CorruptDetected => Err(StorError::new(
                Layer::Low,
                ErrorKind::CorruptCtx("corruption detected earlier; re-init required".to_string()),
            )),
        }
    }

    fn coherence(&self) -> std::result::Result<(), String> {
        if self.device.is_none() {
            return Err("device missing".to_string());
        }
        let scratch = self.scratch.as_ref().ok_or_else(|| "scratch pair missing".to_string())?;
        if !scratch.is_coherent(self.settings.page_length) {
            return Err(format!(
                "scratch buffers are {} bytes, page length is {}",
                scratch.page_length(),
                self.settings.page_length
            ));
        }
        (self.rules)(&self.settings).map_err(|e| e.kind().to_string())
    }

    #[cfg(test)]
    pub(crate) fn settings_mut_for_test(&mut self) -> &mut StorageSettings {
        &mut self.settings
    }
}
