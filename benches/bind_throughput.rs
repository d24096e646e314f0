use criterion::{criterion_group, criterion_main, Criterion};
use parambind::{BindRequest, Bindable, PathParams, Registry};
use std::hint::black_box;
use std::sync::Arc;

#[derive(Debug, Default, Bindable)]
pub struct ListAnimals {
    #[param("<in:path> <required>")]
    pub zoo_id: u64,
    #[param("<in:query> <range:1:500>")]
    pub limit: u32,
    #[param("<in:query>")]
    pub species: Vec<String>,
    #[param("<in:query> <len:0:64>")]
    #[regexp("[a-z ]*")]
    pub name: String,
    #[param("<in:header> <name:x-request-id>")]
    pub request_id: String,
}

fn request() -> BindRequest {
    let req = http::Request::builder()
        .method("GET")
        .uri("/zoos/7/animals?limit=50&species=cat&species=dog&species[]=owl&name=fluffy")
        .header("x-request-id", "bench")
        .body(Vec::new())
        .expect("valid request");
    BindRequest::new(req)
}

fn path_params() -> PathParams {
    [(Arc::from("zoo_id"), "7".to_string())].into_iter().collect()
}

fn bench_schema_bind(c: &mut Criterion) {
    let registry = Registry::default();
    registry
        .register::<ListAnimals>()
        .expect("record registers");
    let params = path_params();
    c.bench_function("schema_bind", |b| {
        b.iter(|| {
            let mut req = request();
            let bound: ListAnimals = registry
                .bind_new(&mut req, &params)
                .expect("request binds");
            black_box(bound);
        })
    });
}

fn bench_adhoc_bind(c: &mut Criterion) {
    c.bench_function("adhoc_bind_indexed", |b| {
        b.iter(|| {
            let req = http::Request::builder()
                .uri("/?ids[3]=4&ids[0]=1&ids[2]=3&ids[1]=2&ids[]=5")
                .body(Vec::new())
                .expect("valid request");
            let mut req = BindRequest::new(req);
            let mut ids: Vec<u32> = Vec::new();
            let found = req.bind_one(&mut ids, "ids").expect("keyed bind");
            black_box((found, ids));
        })
    });
}

criterion_group!(benches, bench_schema_bind, bench_adhoc_bind);
criterion_main!(benches);
