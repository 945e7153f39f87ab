//! The buyer's configuration and the state component that owns it.
//!
//! A [`Configuration`] is an immutable record; every change goes through a
//! [`Mutation`] message applied by [`ConfigurationState`], which swaps in a
//! whole new record and notifies observers. There is never a half-applied
//! configuration visible to anyone.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "lengthId": "3m",
//!   "colorMode": 2,
//!   "colors": ["red.jpg", "navy.jpg"],
//!   "activeColorSlot": 1,
//!   "carabinerId": "silver"
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

// ============================================================================
// ColorMode / ColorSlot
// ============================================================================

/// One or two tape colours. Serialized as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColorMode {
    #[default]
    Single,
    Dual,
}

impl TryFrom<u8> for ColorMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Single),
            2 => Ok(Self::Dual),
            other => Err(format!("colour mode must be 1 or 2, got {other}")),
        }
    }
}

impl From<ColorMode> for u8 {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Single => 1,
            ColorMode::Dual => 2,
        }
    }
}

/// Which colour slot a swatch selection writes to. Serialized as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColorSlot {
    #[default]
    Primary,
    Secondary,
}

impl TryFrom<u8> for ColorSlot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Primary),
            1 => Ok(Self::Secondary),
            other => Err(format!("colour slot must be 0 or 1, got {other}")),
        }
    }
}

impl From<ColorSlot> for u8 {
    fn from(slot: ColorSlot) -> Self {
        match slot {
            ColorSlot::Primary => 0,
            ColorSlot::Secondary => 1,
        }
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// A single change to the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetLength(String),
    /// Switching to single keeps the stored secondary colour and moves the
    /// active slot to primary; switching to dual moves it to secondary.
    SetColorMode(ColorMode),
    /// Writes a swatch into the active slot.
    SelectColor(String),
    SetHardware(String),
    /// The secondary slot cannot be activated in single mode.
    SetActiveSlot(ColorSlot),
}

// ============================================================================
// Configuration
// ============================================================================

/// Everything the buyer has chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConfigurationRecord", into = "ConfigurationRecord")]
pub struct Configuration {
    length_id: String,
    color_mode: ColorMode,
    primary_color: String,
    secondary_color: Option<String>,
    active_slot: ColorSlot,
    hardware_id: String,
}

impl Configuration {
    pub fn new(
        length_id: impl Into<String>,
        primary_color: impl Into<String>,
        hardware_id: impl Into<String>,
    ) -> Self {
        Self {
            length_id: length_id.into(),
            color_mode: ColorMode::Single,
            primary_color: primary_color.into(),
            secondary_color: None,
            active_slot: ColorSlot::Primary,
            hardware_id: hardware_id.into(),
        }
    }

    /// First length, first swatch, first hardware, single colour.
    ///
    /// The catalog must have passed [`Catalog::validate`]; empty lists give
    /// empty ids.
    pub fn defaults_for(catalog: &Catalog) -> Self {
        let first = |s: Option<&String>| s.cloned().unwrap_or_default();
        Self::new(
            first(catalog.lengths.first().map(|l| &l.id)),
            first(catalog.swatches.first().map(|s| &s.file)),
            first(catalog.hardware.first().map(|h| &h.id)),
        )
    }

    pub fn length_id(&self) -> &str {
        &self.length_id
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn primary_color(&self) -> &str {
        &self.primary_color
    }

    /// The stored secondary colour, kept even in single mode.
    pub fn secondary_color(&self) -> Option<&str> {
        self.secondary_color.as_deref()
    }

    /// The colour the secondary region is painted with: the secondary colour
    /// in dual mode when one is chosen, otherwise the primary colour.
    pub fn effective_secondary_color(&self) -> &str {
        match (self.color_mode, self.secondary_color.as_deref()) {
            (ColorMode::Dual, Some(color)) => color,
            _ => &self.primary_color,
        }
    }

    /// Colours that count for the order: one in single mode, up to two in dual.
    pub fn selected_colors(&self) -> Vec<&str> {
        let mut colors = vec![self.primary_color.as_str()];
        if let (ColorMode::Dual, Some(secondary)) = (self.color_mode, self.secondary_color()) {
            colors.push(secondary);
        }
        colors
    }

    pub fn active_slot(&self) -> ColorSlot {
        self.active_slot
    }

    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    /// Returns the record that results from applying `mutation`.
    pub fn with(&self, mutation: Mutation) -> Self {
        let mut next = self.clone();
        match mutation {
            Mutation::SetLength(id) => next.length_id = id,
            Mutation::SetColorMode(mode) => {
                next.color_mode = mode;
                next.active_slot = match mode {
                    ColorMode::Single => ColorSlot::Primary,
                    ColorMode::Dual => ColorSlot::Secondary,
                };
            }
            Mutation::SelectColor(file) => match next.active_slot {
                ColorSlot::Primary => next.primary_color = file,
                ColorSlot::Secondary => next.secondary_color = Some(file),
            },
            Mutation::SetHardware(id) => next.hardware_id = id,
            Mutation::SetActiveSlot(slot) => {
                if slot == ColorSlot::Primary || next.color_mode == ColorMode::Dual {
                    next.active_slot = slot;
                }
            }
        }
        next
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Wire layout of [`Configuration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationRecord {
    length_id: String,
    #[serde(default)]
    color_mode: u8,
    colors: Vec<String>,
    #[serde(default)]
    active_color_slot: u8,
    carabiner_id: String,
}

impl TryFrom<ConfigurationRecord> for Configuration {
    type Error = String;

    fn try_from(record: ConfigurationRecord) -> Result<Self, Self::Error> {
        let color_mode = match record.color_mode {
            0 => ColorMode::Single,
            n => ColorMode::try_from(n)?,
        };
        let active_slot = match (color_mode, ColorSlot::try_from(record.active_color_slot)?) {
            (ColorMode::Single, _) => ColorSlot::Primary,
            (ColorMode::Dual, slot) => slot,
        };
        let mut colors = record.colors.into_iter();
        let primary_color = colors
            .next()
            .ok_or_else(|| "colors must contain at least one swatch".to_string())?;

        Ok(Self {
            length_id: record.length_id,
            color_mode,
            primary_color,
            secondary_color: colors.next(),
            active_slot,
            hardware_id: record.carabiner_id,
        })
    }
}

impl From<Configuration> for ConfigurationRecord {
    fn from(config: Configuration) -> Self {
        let mut colors = vec![config.primary_color];
        colors.extend(config.secondary_color);
        Self {
            length_id: config.length_id,
            color_mode: config.color_mode.into(),
            colors,
            active_color_slot: config.active_slot.into(),
            carabiner_id: config.hardware_id,
        }
    }
}

// ============================================================================
// ConfigurationState
// ============================================================================

type Observer = Box<dyn FnMut(&Configuration) + Send>;

/// Sole owner of the current [`Configuration`].
///
/// Observers registered with [`subscribe`](Self::subscribe) are called with
/// the new record after every change, in registration order.
pub struct ConfigurationState {
    current: Configuration,
    revision: u64,
    observers: Vec<Observer>,
}

impl fmt::Debug for ConfigurationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationState")
            .field("current", &self.current)
            .field("revision", &self.revision)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ConfigurationState {
    pub fn new(initial: Configuration) -> Self {
        Self {
            current: initial,
            revision: 0,
            observers: Vec::new(),
        }
    }

    pub fn current(&self) -> &Configuration {
        &self.current
    }

    /// Number of changes applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&Configuration) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Applies `mutation`. Returns true if the record changed.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        let next = self.current.with(mutation);
        self.replace(next)
    }

    /// Replaces the whole record. Returns true if it differs from the current one.
    pub fn replace(&mut self, next: Configuration) -> bool {
        if next == self.current {
            return false;
        }
        self.current = next;
        self.revision += 1;
        for observer in &mut self.observers {
            observer(&self.current);
        }
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
