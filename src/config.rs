//! # Configuration Provider Module
//!
//! Questo modulo gestisce le opzioni passate agli encoder esterni.
//!
//! ## Responsabilità:
//! - Albero di default embedded: `optimize|convert → formato → lossy|lossless → opzioni`
//! - Caricamento di un file JSON utente con deep-merge sopra i default
//! - Lookup `options(format, mode)` che non fallisce mai: foglia mancante
//!   risolve in un bag di opzioni vuoto
//! - Sub-tree vettoriale (`svg`) esposto per intero, non diviso per modalità
//!
//! ## Struttura del file di configurazione:
//! ```json
//! {
//!   "optimize": {
//!     "jpeg": { "lossy": { "quality": 80 }, "lossless": { "quality": 90 } },
//!     "svg": { "multipass": true }
//!   },
//!   "convert": {
//!     "avif": { "lossy": { "qcolor": 64 } }
//!   }
//! }
//! ```
//!
//! I bag di opzioni sono consumati verbatim dagli invoker: ogni chiave è un
//! flag CLI del tool corrispondente (vedi `invoker::options_to_arguments`).
//! La pipeline non dipende da come la configurazione è stata scoperta o
//! parsata; riceve solo questo provider già risolto.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::context::Mode;

/// Resolved encoder options, keyed by format and lossy/lossless mode.
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    tree: Value,
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self {
            tree: default_tree(),
        }
    }
}

impl ConfigProvider {
    /// Loads a JSON configuration file and deep-merges it over the defaults.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let user: Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in config file: {}", path.display()))?;

        let mut tree = default_tree();
        deep_merge(&mut tree, user);
        Ok(Self { tree })
    }

    /// Options bag for `(format, mode)`. A missing leaf is an empty bag,
    /// never an error.
    pub fn options(&self, format: &str, mode: Mode) -> Map<String, Value> {
        for group in ["optimize", "convert"] {
            if let Some(leaf) = self
                .tree
                .get(group)
                .and_then(|g| g.get(format))
                .and_then(|f| f.get(mode.config_key()))
            {
                if let Some(map) = leaf.as_object() {
                    return map.clone();
                }
            }
        }
        Map::new()
    }

    /// The full vector options sub-tree. SVG rewriting is not mode-split.
    pub fn vector_options(&self) -> Map<String, Value> {
        self.tree
            .get("optimize")
            .and_then(|g| g.get("svg"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// Recursive merge: objects merge key-by-key, everything else replaces.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, other) => *base_slot = other,
    }
}

/// Built-in defaults. Every bag maps one-to-one onto the flags of the tool
/// that consumes it.
fn default_tree() -> Value {
    json!({
        "optimize": {
            // jpegoptim / guetzli
            "jpeg": {
                "lossy": {
                    "max": 80,
                    "strip-all": true,
                    "all-progressive": true
                },
                "lossless": {
                    "quality": 90,
                    "memlimit": 6000
                }
            },
            // pngquant / oxipng
            "png": {
                "lossy": {
                    "quality": "65-80",
                    "speed": 4,
                    "force": true
                },
                "lossless": {
                    "opt": 4,
                    "strip": "safe"
                }
            },
            // gifsicle
            "gif": {
                "lossy": {
                    "optimize": 3,
                    "lossy": 100,
                    "colors": 256
                },
                "lossless": {
                    "optimize": 0,
                    "careful": true,
                    "colors": 256,
                    "lossy": 0
                }
            },
            // svgo, consumed whole
            "svg": {
                "multipass": true,
                "pretty": true,
                "indent": 2
            }
        },
        "convert": {
            // avifenc
            "avif": {
                "lossy": {
                    "qcolor": 64,
                    "speed": 6
                },
                "lossless": {
                    "lossless": true,
                    "speed": 4
                }
            },
            // cwebp
            "webp": {
                "lossy": {
                    "q": 82,
                    "alpha_q": 82,
                    "m": 4,
                    "mt": true
                },
                "lossless": {
                    "lossless": true,
                    "z": 9,
                    "mt": true
                }
            },
            // gif2webp, used for animated input routed to WebP
            "webp_gif": {
                "lossy": {
                    "lossy": true,
                    "m": 4,
                    "mt": true,
                    "min_size": true
                },
                "lossless": {
                    "m": 6,
                    "mt": true
                }
            }
        }
    })
}
