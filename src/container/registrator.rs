//! Registration operations on [`Container`].

use std::sync::Arc;

use super::{Container, ResolverContext};
use crate::error::{DiError, DiResult};
use crate::inject::{build_factory, Inject};
use crate::key::{Contract, ServiceKey};
use crate::metadata::{implemented_contracts, scan, Exported, ExportedType, Implements};
use crate::registration::{erase, identity, upcast_via, AnyArc, Factory, Upcast};
use crate::reuse::{Activation, ReuseType};

// One activation's worth of registrations, validated and ready to add.
struct Group {
    activation: Arc<Activation>,
    entries: Vec<Entry>,
}

struct Entry {
    contract: Contract,
    key: ServiceKey,
    upcast: Upcast,
    clear_exists: bool,
}

impl Container {
    /// Registers `I`, built by constructor injection, as `C` under `key`.
    ///
    /// Repeated registration grows the bucket; nothing is replaced.
    pub fn register<C, I>(&self, reuse: ReuseType, key: impl Into<ServiceKey>)
    where
        C: ?Sized + Send + Sync + 'static,
        I: Inject + Implements<C>,
    {
        let activation = Activation::new(Contract::of::<I>(), reuse, build_factory::<I>());
        self.add_one(Contract::of::<C>(), key.into(), activation, upcast_via::<I, C>());
    }

    /// Registers `I` under every contract it declares, sharing one factory.
    ///
    /// Non-public contracts are included only when `non_public` is set. A
    /// singleton registered this way is one instance whichever contract
    /// resolves it.
    pub fn register_many<I: Exported>(&self, reuse: ReuseType, key: impl Into<ServiceKey>, non_public: bool) {
        self.register_many_of(&ExportedType::of::<I>(), reuse, key, non_public);
    }

    /// [`register_many`](Self::register_many) for an already described type.
    pub fn register_many_of(
        &self,
        exported: &ExportedType,
        reuse: ReuseType,
        key: impl Into<ServiceKey>,
        non_public: bool,
    ) {
        let key = key.into();
        let entries = implemented_contracts(&exported.metadata, non_public)
            .into_iter()
            .filter_map(|contract| {
                exported.cast(contract).map(|upcast| Entry {
                    contract,
                    key: key.clone(),
                    upcast,
                    clear_exists: false,
                })
            })
            .collect();
        self.add_groups(vec![Group {
            activation: Arc::new(Activation::new(
                exported.metadata.implementation,
                reuse,
                exported.factory.clone(),
            )),
            entries,
        }]);
    }

    /// Registers `I` under exactly the given contracts, sharing one factory.
    ///
    /// Fails with [`DiError::NotImplemented`] if `I` does not declare one of
    /// them; nothing is registered in that case.
    pub fn register_many_as<I: Exported>(
        &self,
        contracts: &[Contract],
        reuse: ReuseType,
        key: impl Into<ServiceKey>,
    ) -> DiResult<()> {
        let exported = ExportedType::of::<I>();
        let key = key.into();
        let entries = contracts
            .iter()
            .map(|&contract| {
                let upcast = exported.cast(contract).ok_or_else(|| DiError::NotImplemented {
                    implementation: exported.metadata.implementation.name(),
                    contract: contract.name(),
                })?;
                Ok(Entry {
                    contract,
                    key: key.clone(),
                    upcast,
                    clear_exists: false,
                })
            })
            .collect::<DiResult<Vec<_>>>()?;
        self.add_groups(vec![Group {
            activation: Arc::new(Activation::new(
                exported.metadata.implementation,
                reuse,
                exported.factory.clone(),
            )),
            entries,
        }]);
        Ok(())
    }

    /// Registers a pre-built instance as a singleton.
    pub fn register_instance<C>(&self, instance: Arc<C>, key: impl Into<ServiceKey>)
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(erase(instance.clone())) });
        let activation = Activation::new(Contract::of::<C>(), ReuseType::Singleton, factory);
        self.add_one(Contract::of::<C>(), key.into(), activation, identity());
    }

    /// Registers a closure as the factory for `C`.
    ///
    /// The closure receives the container that is resolving, so it can pull
    /// its own dependencies.
    pub fn register_delegate<C, F>(&self, factory: F, reuse: ReuseType, key: impl Into<ServiceKey>)
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<C>> + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> { factory(ctx).map(erase::<C>) });
        let activation = Activation::new(Contract::of::<C>(), reuse, factory);
        self.add_one(Contract::of::<C>(), key.into(), activation, identity());
    }

    /// Registers every type according to its export markers.
    ///
    /// Types without markers are skipped. Each marker gets its own shared
    /// factory. Markers with `clear_exists` empty their target buckets first.
    /// The whole call is validated before anything is added.
    pub fn register_exports(&self, types: &[ExportedType]) -> DiResult<()> {
        let mut groups: Vec<Group> = Vec::new();
        for exported in types {
            let first = groups.len();
            for intent in scan(&exported.metadata) {
                let upcast = exported.cast(intent.contract).ok_or_else(|| DiError::NotImplemented {
                    implementation: exported.metadata.implementation.name(),
                    contract: intent.contract.name(),
                })?;
                let index = first + intent.group;
                while groups.len() <= index {
                    groups.push(Group {
                        activation: Arc::new(Activation::new(
                            exported.metadata.implementation,
                            intent.reuse,
                            exported.factory.clone(),
                        )),
                        entries: Vec::new(),
                    });
                }
                groups[index].entries.push(Entry {
                    contract: intent.contract,
                    key: intent.key,
                    upcast,
                    clear_exists: intent.clear_exists,
                });
            }
        }
        self.add_groups(groups);
        Ok(())
    }

    /// Removes every registration of `(C, key)`. Returns whether any existed.
    pub fn unregister<C: ?Sized + 'static>(&self, key: impl Into<ServiceKey>) -> bool {
        let key = key.into();
        let removed = self.table.write().remove_all(Contract::of::<C>(), &key);
        tracing::debug!(contract = std::any::type_name::<C>(), %key, removed, "unregister");
        removed
    }

    /// Removes every registration under `key` built by `I`, whatever its
    /// contract. Returns how many were removed.
    pub fn unregister_implementation<I: ?Sized + 'static>(&self, key: impl Into<ServiceKey>) -> usize {
        let key = key.into();
        let removed = self
            .table
            .write()
            .remove_implementation(Contract::of::<I>(), &key);
        tracing::debug!(implementation = std::any::type_name::<I>(), %key, removed, "unregister implementation");
        removed
    }

    /// Removes every registration.
    pub fn unregister_all(&self) {
        self.table.write().clear();
        tracing::debug!("unregister all");
    }

    fn add_one(&self, contract: Contract, key: ServiceKey, activation: Activation, upcast: Upcast) {
        tracing::debug!(%contract, %key, reuse = ?activation.reuse(), "register");
        self.table.write().add(contract, key, Arc::new(activation), upcast);
    }

    fn add_groups(&self, groups: Vec<Group>) {
        let mut table = self.table.write();
        for group in groups {
            for entry in group.entries.iter().filter(|e| e.clear_exists) {
                table.remove_all(entry.contract, &entry.key);
            }
            for entry in group.entries {
                tracing::debug!(
                    contract = %entry.contract,
                    key = %entry.key,
                    implementation = group.activation.implementation().name(),
                    reuse = ?group.activation.reuse(),
                    "register"
                );
                table.add(entry.contract, entry.key, group.activation.clone(), entry.upcast);
            }
        }
    }
}
