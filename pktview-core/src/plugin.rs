//! Capability-based plugin discovery.
//!
//! A [`TypeUniverse`] lists candidate types. Discovery keeps those that
//! implement the capability and can be built without arguments, and caches
//! that list for the life of the [`PluginDiscovery`]. Instances are never
//! cached: each [`PluginDiscovery::create_instances`] call builds new ones.

use std::sync::OnceLock;

use crate::error::SetupError;

/// Zero-argument constructor of a plugin type.
pub type Constructor<T> = fn() -> Result<Box<T>, SetupError>;

/// A type considered during discovery.
pub enum Candidate<T: ?Sized> {
    /// Type that does not implement the capability.
    Unrelated { type_name: &'static str },
    /// Type implementing the capability, with its constructor if it has one.
    Implements {
        type_name: &'static str,
        constructor: Option<Constructor<T>>,
    },
}

impl<T: ?Sized> Candidate<T> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Candidate::Unrelated { type_name } | Candidate::Implements { type_name, .. } => {
                *type_name
            }
        }
    }
}

impl<T: ?Sized> Clone for Candidate<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Candidate<T> {}

/// A set of candidate types.
pub trait TypeUniverse<T: ?Sized> {
    fn candidates(&self) -> Vec<Candidate<T>>;
}

impl<T: ?Sized> TypeUniverse<T> for [Candidate<T>] {
    fn candidates(&self) -> Vec<Candidate<T>> {
        self.to_vec()
    }
}

impl<T: ?Sized, const N: usize> TypeUniverse<T> for [Candidate<T>; N] {
    fn candidates(&self) -> Vec<Candidate<T>> {
        self.to_vec()
    }
}

/// A discovered plugin type.
pub struct PluginType<T: ?Sized> {
    type_name: &'static str,
    constructor: Constructor<T>,
}

impl<T: ?Sized> PluginType<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Build a new instance.
    pub fn instantiate(&self) -> Result<Box<T>, SetupError> {
        (self.constructor)()
    }
}

impl<T: ?Sized> std::fmt::Debug for PluginType<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginType")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Filter a universe down to constructible implementors.
///
/// Implementors without a constructor are returned as errors so the caller
/// can report them; unrelated types are dropped silently.
pub fn discover_types<T: ?Sized>(
    universe: &dyn TypeUniverse<T>,
) -> (Vec<PluginType<T>>, Vec<SetupError>) {
    let mut types = Vec::new();
    let mut skipped = Vec::new();
    for candidate in universe.candidates() {
        match candidate {
            Candidate::Unrelated { .. } => {}
            Candidate::Implements {
                type_name,
                constructor: Some(constructor),
            } => types.push(PluginType {
                type_name,
                constructor,
            }),
            Candidate::Implements {
                type_name,
                constructor: None,
            } => skipped.push(SetupError::MissingConstructor { type_name }),
        }
    }
    (types, skipped)
}

/// Discovery with a cached type list.
pub struct PluginDiscovery<T: ?Sized> {
    types: OnceLock<Vec<PluginType<T>>>,
}

impl<T: ?Sized> PluginDiscovery<T> {
    pub const fn new() -> Self {
        Self {
            types: OnceLock::new(),
        }
    }

    /// Discovered types. Scans `universe` on the first call only.
    pub fn discover(&self, universe: &dyn TypeUniverse<T>) -> &[PluginType<T>] {
        self.types.get_or_init(|| {
            let (types, skipped) = discover_types(universe);
            for err in &skipped {
                tracing::warn!(error = %err, "skipping plugin type");
            }
            tracing::debug!(found = types.len(), skipped = skipped.len(), "plugin discovery");
            types
        })
    }

    /// Types found by an earlier [`discover`](Self::discover), if any.
    pub fn types(&self) -> Option<&[PluginType<T>]> {
        self.types.get().map(Vec::as_slice)
    }

    /// Build one fresh instance of every discovered type.
    pub fn create_instances(
        &self,
        universe: &dyn TypeUniverse<T>,
    ) -> Result<Vec<Box<T>>, SetupError> {
        self.discover(universe)
            .iter()
            .map(PluginType::instantiate)
            .collect()
    }
}

impl<T: ?Sized> Default for PluginDiscovery<T> {
    fn default() -> Self {
        Self::new()
    }
}
