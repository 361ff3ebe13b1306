// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Where a module image comes from.

use std::fmt;
use std::path::{Path, PathBuf};

use eml_error::{kinds, Result};

/// A resolved module location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLocation {
    /// A file on the local file system
    File(PathBuf),
}

impl ModuleLocation {
    /// Parse a plain path or `file://` URL, resolving relative paths
    /// against `base`. Other URL schemes are rejected as I/O errors.
    pub fn parse(location: &str, base: Option<&Path>) -> Result<Self> {
        let path = match location.split_once("://") {
            Some(("file", rest)) => PathBuf::from(rest),
            Some((scheme, _)) if is_scheme(scheme) => {
                return Err(kinds::unsupported_location(location));
            }
            _ => PathBuf::from(location),
        };
        let path = match base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        };
        Ok(Self::File(path))
    }

    /// The file system path of this location
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
        }
    }
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_file_urls() {
        let plain = ModuleLocation::parse("bin/eval.wasm", None).unwrap();
        assert_eq!(plain.path(), Path::new("bin/eval.wasm"));

        let url = ModuleLocation::parse("file:///opt/eval.wasm", None).unwrap();
        assert_eq!(url.path(), Path::new("/opt/eval.wasm"));
    }

    #[test]
    fn test_relative_to_base() {
        let base = Path::new("/srv/tests");
        let relative = ModuleLocation::parse("../bin/eval.wasm", Some(base)).unwrap();
        assert_eq!(relative.path(), Path::new("/srv/tests/../bin/eval.wasm"));

        let absolute = ModuleLocation::parse("/abs/eval.wasm", Some(base)).unwrap();
        assert_eq!(absolute.path(), Path::new("/abs/eval.wasm"));
    }

    #[test]
    fn test_network_schemes_are_unsupported() {
        let err = ModuleLocation::parse("https://example.com/eval.wasm", None).unwrap_err();
        assert!(err.is_io_error());
        assert_eq!(err.code, eml_error::codes::UNSUPPORTED_LOCATION);
    }
}
