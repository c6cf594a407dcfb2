#![no_main]

use ioc_container::{Container, Resolver, ReuseType, ServiceKey};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

// Each byte pair is one operation against the container, mirrored in a
// plain list of (key, value) registrations.
fuzz_target!(|data: &[u8]| {
    let container = Container::new();
    let mut model: Vec<(Option<u8>, u8)> = Vec::new();

    for op in data.chunks_exact(2) {
        let key = match op[1] % 5 {
            0 => None,
            k => Some(k),
        };
        let service_key = ServiceKey::from(key.map(u32::from));
        match op[0] % 6 {
            0 => {
                container.register_instance(Arc::new(op[1]), service_key);
                model.push((key, op[1]));
            }
            1 => {
                let value = op[1];
                container.register_delegate::<u8, _>(move |_| Ok(Arc::new(value)), ReuseType::Transient, service_key);
                model.push((key, op[1]));
            }
            2 => {
                let existed = container.unregister::<u8>(service_key);
                assert_eq!(existed, model.iter().any(|(k, _)| *k == key));
                model.retain(|(k, _)| *k != key);
            }
            3 => {
                let expected: Vec<u8> = model.iter().filter(|(k, _)| *k == key).map(|(_, v)| *v).collect();
                let single = container.try_resolve::<u8>(service_key).unwrap();
                match expected.as_slice() {
                    [only] => assert_eq!(single.map(|v| *v), Some(*only)),
                    _ => assert!(single.is_none()),
                }
            }
            4 => {
                let expected: Vec<u8> = model.iter().filter(|(k, _)| *k == key).map(|(_, v)| *v).collect();
                let all: Vec<u8> = container
                    .resolve_all::<u8>(service_key)
                    .unwrap()
                    .iter()
                    .map(|v| **v)
                    .collect();
                assert_eq!(all, expected);
            }
            _ => {
                let clone = container.clone();
                assert_eq!(clone.len(), model.len());
                clone.unregister_all();
                assert_eq!(container.len(), model.len());
            }
        }
    }
});
