mod common;

use common::http_helpers::get;
use common::path_params;
use parambind::{Bindable, Registry};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Default, Bindable)]
pub struct Lookup {
    #[param("<in:path> <required>")]
    pub id: u32,
    #[param("<in:query> <range:0:1000>")]
    pub offset: u32,
}

#[derive(Debug, Default, Bindable)]
pub struct Late {
    #[param("<in:query>")]
    pub flag: bool,
}

#[test]
fn test_parallel_binds_share_one_registration() {
    let registry = Registry::default();
    registry.register::<Lookup>().unwrap();

    thread::scope(|scope| {
        for t in 0..8u32 {
            let registry = registry.clone();
            scope.spawn(move || {
                for i in 0..200u32 {
                    let id = (t * 1000 + i).to_string();
                    let mut req = get(&format!("/items/{}?offset={}", id, i));
                    let lookup: Lookup = registry
                        .bind_new(&mut req, &path_params(&[("id", id.as_str())]))
                        .unwrap();
                    assert_eq!(lookup.id, t * 1000 + i);
                    assert_eq!(lookup.offset, i);
                }
            });
        }
    });
}

#[test]
fn test_registration_while_binding() {
    let registry = Arc::new(Registry::default());
    registry.register::<Lookup>().unwrap();

    thread::scope(|scope| {
        let binder = Arc::clone(&registry);
        scope.spawn(move || {
            for _ in 0..500 {
                let mut req = get("/items/1?offset=5");
                let lookup: Lookup = binder
                    .bind_new(&mut req, &path_params(&[("id", "1")]))
                    .unwrap();
                assert_eq!(lookup.offset, 5);
            }
        });
        let writer = Arc::clone(&registry);
        scope.spawn(move || {
            for _ in 0..50 {
                writer.register::<Late>().unwrap();
            }
        });
    });

    assert_eq!(registry.len(), 2);
}
