//! Registration types and the registration table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::container::ResolverContext;
use crate::error::{DiError, DiResult};
use crate::key::{Contract, ServiceKey};
use crate::metadata::Implements;
use crate::reuse::{Activation, ReuseType};

// Type-erased instance. Always holds an `Arc<X>` for some (possibly unsized) X.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

// Converts an activation's instance into the registration's contract.
pub(crate) type Upcast = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

#[inline(always)]
pub(crate) fn erase<C: ?Sized + Send + Sync + 'static>(instance: Arc<C>) -> AnyArc {
    Arc::new(instance)
}

#[inline(always)]
pub(crate) fn unerase<C: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<C>> {
    any.downcast::<Arc<C>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<C>()))
}

pub(crate) fn identity() -> Upcast {
    Arc::new(|any: AnyArc| -> DiResult<AnyArc> { Ok(any) })
}

pub(crate) fn upcast_via<I, C>() -> Upcast
where
    I: Implements<C>,
    C: ?Sized + Send + Sync + 'static,
{
    Arc::new(|any: AnyArc| -> DiResult<AnyArc> { Ok(erase(I::upcast(unerase::<I>(any)?))) })
}

/// One entry of the registration table.
///
/// Registrations are immutable; removing one takes it out of the table.
/// Cloning a `Registration` is cheap and shares its activation.
#[derive(Clone)]
pub struct Registration {
    pub(crate) contract: Contract,
    pub(crate) key: ServiceKey,
    pub(crate) ordinal: u64,
    pub(crate) activation: Arc<Activation>,
    pub(crate) upcast: Upcast,
}

impl Registration {
    /// The contract this registration answers for.
    pub fn contract(&self) -> Contract {
        self.contract
    }

    /// The service key of its bucket.
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// Insertion ordinal; the only ordering guarantee between registrations.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn reuse(&self) -> ReuseType {
        self.activation.reuse()
    }

    /// The type the factory builds (the contract itself for delegates and instances).
    pub fn implementation(&self) -> Contract {
        self.activation.implementation()
    }

    pub(crate) fn activation_id(&self) -> usize {
        Arc::as_ptr(&self.activation) as usize
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("contract", &self.contract.name())
            .field("key", &self.key)
            .field("ordinal", &self.ordinal)
            .field("reuse", &self.reuse())
            .field("implementation", &self.implementation().name())
            .finish()
    }
}

type BucketKey = (Contract, ServiceKey);

/// Append-only, bucketed store of registrations.
///
/// Buckets are keyed by `(contract, service key)`. Adding never replaces;
/// each bucket keeps its registrations in ascending ordinal order.
#[derive(Default)]
pub(crate) struct RegistrationTable {
    buckets: HashMap<BucketKey, Vec<Registration>>,
    next_ordinal: u64,
}

impl RegistrationTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends to the bucket and returns the assigned ordinal.
    pub(crate) fn add(
        &mut self,
        contract: Contract,
        key: ServiceKey,
        activation: Arc<Activation>,
        upcast: Upcast,
    ) -> u64 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let registration = Registration {
            contract,
            key: key.clone(),
            ordinal,
            activation,
            upcast,
        };
        self.buckets.entry((contract, key)).or_default().push(registration);
        ordinal
    }

    /// Drops the whole bucket. Returns whether it held anything.
    pub(crate) fn remove_all(&mut self, contract: Contract, key: &ServiceKey) -> bool {
        self.buckets
            .remove(&(contract, key.clone()))
            .map_or(false, |bucket| !bucket.is_empty())
    }

    /// Drops every registration under `key` whose activation builds `implementation`.
    pub(crate) fn remove_implementation(&mut self, implementation: Contract, key: &ServiceKey) -> usize {
        let mut removed = 0;
        self.buckets.retain(|(_, bucket_key), bucket| {
            if bucket_key == key {
                let before = bucket.len();
                bucket.retain(|r| r.implementation() != implementation);
                removed += before - bucket.len();
            }
            !bucket.is_empty()
        });
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
    }

    pub(crate) fn bucket(&self, contract: Contract, key: &ServiceKey) -> &[Registration] {
        self.buckets
            .get(&(contract, key.clone()))
            .map_or(&[], Vec::as_slice)
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Every registration, ascending by ordinal.
    pub(crate) fn all(&self) -> Vec<Registration> {
        let mut all: Vec<Registration> = self.buckets.values().flatten().cloned().collect();
        all.sort_by_key(|r| r.ordinal);
        all
    }

    /// Copies every registration with the same factories, keys and ordinals
    /// but fresh singleton slots. Registrations that shared an activation in
    /// `self` share one new activation in the copy.
    pub(crate) fn clone_unrealized(&self) -> Self {
        let mut fresh: HashMap<usize, Arc<Activation>> = HashMap::new();
        let buckets = self
            .buckets
            .iter()
            .map(|(bucket_key, bucket)| {
                let copied = bucket
                    .iter()
                    .map(|r| Registration {
                        activation: fresh
                            .entry(r.activation_id())
                            .or_insert_with(|| Arc::new(r.activation.unrealized()))
                            .clone(),
                        ..r.clone()
                    })
                    .collect();
                (bucket_key.clone(), copied)
            })
            .collect();
        Self {
            buckets,
            next_ordinal: self.next_ordinal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: u32, reuse: ReuseType) -> Arc<Activation> {
        let factory: Factory =
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(erase(Arc::new(value))) });
        Arc::new(Activation::new(Contract::of::<u32>(), reuse, factory))
    }

    #[test]
    fn test_add_grows_bucket_in_order() {
        let mut table = RegistrationTable::new();
        let c = Contract::of::<u32>();
        table.add(c, ServiceKey::NONE, constant(1, ReuseType::Transient), identity());
        table.add(c, ServiceKey::NONE, constant(2, ReuseType::Singleton), identity());
        table.add(c, ServiceKey::from("x"), constant(3, ReuseType::Transient), identity());

        let bucket = table.bucket(c, &ServiceKey::NONE);
        assert_eq!(bucket.len(), 2);
        assert!(bucket[0].ordinal() < bucket[1].ordinal());
        assert_eq!(table.bucket(c, &ServiceKey::from("x")).len(), 1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_remove_all_reports_presence() {
        let mut table = RegistrationTable::new();
        let c = Contract::of::<u32>();
        assert!(!table.remove_all(c, &ServiceKey::NONE));
        table.add(c, ServiceKey::NONE, constant(1, ReuseType::Transient), identity());
        assert!(table.remove_all(c, &ServiceKey::NONE));
        assert!(table.bucket(c, &ServiceKey::NONE).is_empty());
    }

    #[test]
    fn test_clone_keeps_activation_sharing() {
        let mut table = RegistrationTable::new();
        let shared = constant(1, ReuseType::Singleton);
        table.add(Contract::of::<u32>(), ServiceKey::NONE, shared.clone(), identity());
        table.add(Contract::of::<u64>(), ServiceKey::NONE, shared, identity());

        let copy = table.clone_unrealized();
        let a = &copy.bucket(Contract::of::<u32>(), &ServiceKey::NONE)[0];
        let b = &copy.bucket(Contract::of::<u64>(), &ServiceKey::NONE)[0];
        assert_eq!(a.activation_id(), b.activation_id());
        assert_ne!(
            a.activation_id(),
            table.bucket(Contract::of::<u32>(), &ServiceKey::NONE)[0].activation_id()
        );
        assert_eq!(copy.all().len(), 2);
    }
}
