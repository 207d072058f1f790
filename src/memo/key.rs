//! Argument Key Module
//!
//! Canonical cache keys derived from a call's positional arguments.

use std::fmt;

use serde::Serialize;

use super::canonical;
use crate::error::Result;

// == Arg Key ==
/// Canonical, hashable form of an argument list.
///
/// Arguments are passed as a tuple and encoded through serde into compact
/// JSON-like text:
/// - order is preserved, so `(1, 2)` and `(2, 1)` differ
/// - arity is part of the key: `(1,)` is `[1]`, `(1, None)` is `[1,null]`
/// - `Some(x)` is tagged, so `None` and `Some(None)` differ
/// - map arguments are rendered with sorted keys, so a `HashMap` gives the
///   same key whatever its iteration order
/// - sets are encoded as sequences in iteration order; use `BTreeSet` for
///   set arguments that must collide
///
/// Non-finite floats (`NaN`, `inf`, `-inf`), and any `Serialize` impl that
/// reports an error, fail with
/// [`MemoError::KeyDerivation`](crate::error::MemoError).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgKey(String);

impl ArgKey {
    // == Derive ==
    /// Encodes `args` into a key.
    pub fn derive<A: Serialize + ?Sized>(args: &A) -> Result<Self> {
        Ok(Self(canonical::to_canonical(args)?))
    }

    /// Returns the canonical text of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
