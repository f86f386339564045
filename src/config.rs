//! Generation options. Settable as CLI flags or from a JSON file.
use std::path::Path;

use clap::Args;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Args, Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// C++ namespace wrapping every emitted definition
    #[arg(long, default_value = "kraken")]
    pub namespace: String,

    /// prefix of the emitted header's include guard
    #[arg(long, default_value = "KRAKENBRIDGE")]
    pub guard_prefix: String,

    /// only emit the `.cc` source
    #[arg(long, default_value_t = false)]
    pub no_header: bool,

    /// lines of the leading copyright comment (repeatable)
    #[arg(long = "copyright", default_values_t = default_copyright())]
    pub copyright: Vec<String>,
}

fn default_copyright() -> Vec<String> {
    vec![
        "Copyright (C) 2021 Alibaba Inc. All rights reserved.".to_string(),
        "Author: Kraken Team.".to_string(),
    ]
}

impl Default for Options {
    fn default() -> Self {
        Self {
            namespace: "kraken".to_string(),
            guard_prefix: "KRAKENBRIDGE".to_string(),
            no_header: false,
            copyright: default_copyright(),
        }
    }
}

impl Options {
    pub fn load(path: &Path) -> Result<Self> {
        std::fs::read_to_string(path)
            .map_err(|error| error.to_string())
            .and_then(|source| crate::path_de::from_str_with_path(&source))
            .map_err(|message| Error::Load {
                path: path.to_path_buf(),
                message,
            })
    }
}
