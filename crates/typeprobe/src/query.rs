//! Discovery queries
//!
//! Four combinators over a [`TypeUniverse`], each a pure filter:
//!
//! | Combinator                        | Passes when                                   | Yields                |
//! |-----------------------------------|-----------------------------------------------|-----------------------|
//! | `with_marker`                     | type carries the marker                       | `(type, marker data)` |
//! | `with_capability`                 | capability checker reports true               | `type`                |
//! | `with_marker_and_capability`      | both of the above                             | `(type, marker data)` |
//! | `with_marker_and_ancestor`        | marker present and ancestor in parent chain   | `(type, marker data)` |
//!
//! Module resolution and contract validation happen eagerly when a query is
//! built; enumeration and filtering happen lazily as the result is iterated.

use serde::de::DeserializeOwned;

use crate::error::{ProbeError, ProbeResult};
use crate::module::ModuleSet;
use crate::registry::{MarkerKind, Registry, TypeDescriptor};
use crate::universe::TypeUniverse;
use crate::value::Value;

/// Check whether `ty` implements the capability `contract`.
///
/// Fails with `NotACapabilityContract` if `contract` is not a contract.
/// Only contracts declared directly on `ty` count; contracts declared on its
/// ancestors are not consulted. A contract trivially implements itself.
pub fn is_capability_implemented(ty: &TypeDescriptor, contract: &TypeDescriptor) -> ProbeResult<bool> {
    ensure_contract(contract)?;
    Ok(declares_capability(ty, contract))
}

fn ensure_contract(contract: &TypeDescriptor) -> ProbeResult<()> {
    if contract.is_contract() {
        Ok(())
    } else {
        Err(ProbeError::NotACapabilityContract {
            type_name: contract.name().to_string(),
        })
    }
}

fn declares_capability(ty: &TypeDescriptor, contract: &TypeDescriptor) -> bool {
    ty.key() == contract.key() || ty.declares_contract(contract.key())
}

/// Get the data of a marker that `ty` must carry.
///
/// Fails with `MarkerMissing` naming both the type and the marker kind.
pub fn require_marker<'t>(ty: &'t TypeDescriptor, marker: &MarkerKind) -> ProbeResult<&'t Value> {
    ty.marker(marker).ok_or_else(|| ProbeError::MarkerMissing {
        type_name: ty.name().to_string(),
        marker: marker.to_string(),
    })
}

/// Like [`require_marker`], deserializing the data into `T`.
pub fn require_marker_as<T: DeserializeOwned>(ty: &TypeDescriptor, marker: &MarkerKind) -> ProbeResult<T> {
    let data = require_marker(ty, marker)?;
    serde_json::to_value(data)
        .and_then(serde_json::from_value)
        .map_err(|source| ProbeError::MarkerData {
            type_name: ty.name().to_string(),
            marker: marker.to_string(),
            source,
        })
}

/// Combination of predicates a combinator filters by.
///
/// Built by the combinators themselves; an absent field places no
/// constraint. Contracts are validated before a query is built.
#[derive(Debug, Clone, Copy, Default)]
struct MembershipQuery<'q> {
    marker: Option<&'q MarkerKind>,
    contract: Option<&'q TypeDescriptor>,
    ancestor: Option<&'q TypeDescriptor>,
}

impl<'q> MembershipQuery<'q> {
    /// Evaluate against one descriptor.
    ///
    /// Returns `None` when the type does not pass, otherwise the marker data
    /// (if a marker was requested).
    fn evaluate<'r>(&self, registry: &Registry, ty: &'r TypeDescriptor) -> Option<Option<&'r Value>> {
        let data = match self.marker {
            Some(marker) => Some(ty.marker(marker)?),
            None => None,
        };
        if let Some(contract) = self.contract {
            if !declares_capability(ty, contract) {
                return None;
            }
        }
        if let Some(ancestor) = self.ancestor {
            if !registry.descends_from(ty, ancestor.key()) {
                return None;
            }
        }
        Some(data)
    }
}

/// Discovery queries over a resolved set of modules
#[derive(Debug, Clone)]
pub struct Discovery<'r> {
    universe: TypeUniverse<'r>,
}

impl<'r> Discovery<'r> {
    /// Resolve `modules` against `registry`.
    ///
    /// Fails with `ModuleNotFound` on the first unknown module name.
    pub fn new(registry: &'r Registry, modules: &ModuleSet) -> ProbeResult<Self> {
        Ok(Self {
            universe: TypeUniverse::resolve(registry, modules)?,
        })
    }

    /// Universe the queries run over
    pub fn universe(&self) -> &TypeUniverse<'r> {
        &self.universe
    }

    fn filter<'q>(
        &self,
        query: MembershipQuery<'q>,
    ) -> impl Iterator<Item = (&'r TypeDescriptor, Option<&'r Value>)> + 'q
    where
        'r: 'q,
    {
        let registry = self.universe.registry();
        self.universe
            .types()
            .filter_map(move |ty| query.evaluate(registry, ty).map(|data| (ty, data)))
    }

    fn filter_marked<'q>(
        &self,
        query: MembershipQuery<'q>,
    ) -> impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q
    where
        'r: 'q,
    {
        self.filter(query)
            .filter_map(|(ty, data)| data.map(|data| (ty, data)))
    }

    /// Types carrying `marker`, with the marker's data
    pub fn with_marker<'q>(
        &self,
        marker: &'q MarkerKind,
    ) -> impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q
    where
        'r: 'q,
    {
        self.filter_marked(MembershipQuery {
            marker: Some(marker),
            ..Default::default()
        })
    }

    /// Types implementing `contract` directly
    pub fn with_capability<'q>(
        &self,
        contract: &'q TypeDescriptor,
    ) -> ProbeResult<impl Iterator<Item = &'r TypeDescriptor> + 'q>
    where
        'r: 'q,
    {
        ensure_contract(contract)?;
        Ok(self
            .filter(MembershipQuery {
                contract: Some(contract),
                ..Default::default()
            })
            .map(|(ty, _)| ty))
    }

    /// Types carrying `marker` and implementing `contract` directly
    pub fn with_marker_and_capability<'q>(
        &self,
        marker: &'q MarkerKind,
        contract: &'q TypeDescriptor,
    ) -> ProbeResult<impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q>
    where
        'r: 'q,
    {
        ensure_contract(contract)?;
        Ok(self.filter_marked(MembershipQuery {
            marker: Some(marker),
            contract: Some(contract),
            ancestor: None,
        }))
    }

    /// Types carrying `marker` with `ancestor` anywhere in their parent chain
    pub fn with_marker_and_ancestor<'q>(
        &self,
        marker: &'q MarkerKind,
        ancestor: &'q TypeDescriptor,
    ) -> impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q
    where
        'r: 'q,
    {
        self.filter_marked(MembershipQuery {
            marker: Some(marker),
            contract: None,
            ancestor: Some(ancestor),
        })
    }
}

/// Find all types in `modules` carrying `marker`.
pub fn find_types_with_marker<'q, 'r: 'q>(
    registry: &'r Registry,
    modules: &ModuleSet,
    marker: &'q MarkerKind,
) -> ProbeResult<impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q> {
    Ok(Discovery::new(registry, modules)?.with_marker(marker))
}

/// Find all types in `modules` directly implementing `contract`.
pub fn find_types_with_capability<'q, 'r: 'q>(
    registry: &'r Registry,
    modules: &ModuleSet,
    contract: &'q TypeDescriptor,
) -> ProbeResult<impl Iterator<Item = &'r TypeDescriptor> + 'q> {
    Discovery::new(registry, modules)?.with_capability(contract)
}

/// Find all types in `modules` carrying `marker` and directly implementing `contract`.
pub fn find_types_with_marker_and_capability<'q, 'r: 'q>(
    registry: &'r Registry,
    modules: &ModuleSet,
    marker: &'q MarkerKind,
    contract: &'q TypeDescriptor,
) -> ProbeResult<impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q> {
    Discovery::new(registry, modules)?.with_marker_and_capability(marker, contract)
}

/// Find all types in `modules` carrying `marker` that descend from `ancestor`.
pub fn find_types_with_marker_and_ancestor<'q, 'r: 'q>(
    registry: &'r Registry,
    modules: &ModuleSet,
    marker: &'q MarkerKind,
    ancestor: &'q TypeDescriptor,
) -> ProbeResult<impl Iterator<Item = (&'r TypeDescriptor, &'r Value)> + 'q> {
    Ok(Discovery::new(registry, modules)?.with_marker_and_ancestor(marker, ancestor))
}
