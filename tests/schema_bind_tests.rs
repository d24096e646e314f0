mod common;

use common::http_helpers::{form_post, get, get_with_headers, json_post, multipart_post};
use common::path_params;
use parambind::schema::yaml_decoder;
use parambind::{
    BindErrorKind, Bindable, Body, ConvertError, Cookie, MultipartForm, Position,
    RegisterOptions, Registry, UploadedFile, ViolationKind,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Default, Bindable)]
pub struct GetItem {
    #[param("<in:path> <required>")]
    pub id: u64,
    #[param("<in:query> <range:1:100>")]
    pub limit: u32,
    #[param("<in:query>")]
    pub tags: Vec<String>,
    #[param("<in:query> <name:q> <len:2:8>")]
    pub search: String,
    #[param("<in:header> <name:x-request-id>")]
    pub request_id: String,
    #[param("<in:cookie> <name:session>")]
    pub session: String,
}

#[derive(Debug, Default, Bindable)]
pub struct Signup {
    #[param("<in:formData> <required> <len:3:12>")]
    #[regexp("[a-z][a-z0-9_]*")]
    pub login: String,
    #[param("<in:formData> <range:13:130>")]
    #[err("age must be between 13 and 130")]
    pub age: u8,
    #[param("<in:formData>")]
    pub newsletter: bool,
}

#[derive(Debug, Default, Bindable)]
pub struct Profile {
    #[param]
    pub name: String,
    #[param("<name:years>")]
    pub age: u8,
}

#[derive(Debug, Default, Bindable)]
pub struct Paging {
    #[param("<in:query>")]
    pub page: u32,
    #[param("<in:query>")]
    pub per_page: u32,
}

#[derive(Debug, Default, Bindable)]
pub struct Search {
    #[param("<in:query>")]
    pub user: Profile,
    #[param(flatten)]
    pub paging: Paging,
    #[param("<in:query>")]
    pub filters: BTreeMap<String, String>,
    #[param("<in:query>")]
    pub ids: Vec<u32>,
    internal: String,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct NewPet {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Bindable)]
pub struct CreatePet {
    #[param("<in:path> <required>")]
    pub owner: String,
    #[param("<in:body> <required>")]
    pub pet: Body<NewPet>,
}

#[derive(Debug, Default, Bindable)]
pub struct Upload {
    #[param("<in:formData> <required>")]
    pub avatar: UploadedFile,
    #[param("<in:formData>")]
    pub attachments: Vec<UploadedFile>,
    #[param("<in:formData>")]
    pub title: String,
    #[param("<in:formData> <maxmb:1>")]
    pub note: String,
}

#[derive(Debug, Default, Bindable)]
pub struct Session {
    #[param("<in:cookie> <name:sid> <required>")]
    pub sid: Cookie,
    #[param("<in:header> <name:x-trace> <nonzero>")]
    pub trace: Vec<String>,
}

fn registry() -> Registry {
    let registry = Registry::default();
    registry.register::<GetItem>().unwrap();
    registry.register::<Signup>().unwrap();
    registry.register::<Search>().unwrap();
    registry.register::<CreatePet>().unwrap();
    registry.register::<Upload>().unwrap();
    registry.register::<Session>().unwrap();
    registry
}

#[test]
fn test_bind_all_positions() {
    let registry = registry();
    let mut req = get_with_headers(
        "/items/42?limit=10&tags=a&tags=b&q=rust",
        &[("x-request-id", "req-1"), ("cookie", "session=abc; theme=dark")],
    );
    let item: GetItem = registry
        .bind_new(&mut req, &path_params(&[("id", "42")]))
        .unwrap();

    assert_eq!(item.id, 42);
    assert_eq!(item.limit, 10);
    assert_eq!(item.tags, vec!["a", "b"]);
    assert_eq!(item.search, "rust");
    assert_eq!(item.request_id, "req-1");
    assert_eq!(item.session, "abc");
}

#[test]
fn test_missing_path_param() {
    let registry = registry();
    let mut req = get("/items?limit=10");
    let err = registry
        .bind_new::<GetItem>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert_eq!(err.param(), "id");
    assert_eq!(err.kind(), &BindErrorKind::Missing(Position::Path));
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "[parambind] GetItem | id | missing path param");
}

#[test]
fn test_range_implies_required() {
    let registry = registry();
    let mut req = get("/items/1");
    let err = registry
        .bind_new::<GetItem>(&mut req, &path_params(&[("id", "1")]))
        .unwrap_err();
    assert_eq!(err.param(), "limit");
    assert_eq!(err.kind(), &BindErrorKind::Missing(Position::Query));
}

#[test]
fn test_range_boundaries() {
    let registry = registry();
    let params = path_params(&[("id", "1")]);

    for (limit, expected) in [
        ("0", Some(ViolationKind::TooSmall)),
        ("1", None),
        ("100", None),
        ("101", Some(ViolationKind::TooBig)),
    ] {
        let mut req = get(&format!("/items/1?limit={}", limit));
        let result = registry.bind_new::<GetItem>(&mut req, &params);
        match expected {
            None => assert!(result.is_ok(), "limit={} should bind", limit),
            Some(kind) => assert_eq!(result.unwrap_err().violation(), Some(kind)),
        }
    }
}

#[test]
fn test_len_boundaries_count_characters() {
    let registry = registry();
    let params = path_params(&[("id", "1")]);

    let mut req = get("/items/1?limit=1&q=a");
    let err = registry.bind_new::<GetItem>(&mut req, &params).unwrap_err();
    assert_eq!(err.param(), "q");
    assert_eq!(err.violation(), Some(ViolationKind::TooShort));

    let mut req = get("/items/1?limit=1&q=abcdefghi");
    let err = registry.bind_new::<GetItem>(&mut req, &params).unwrap_err();
    assert_eq!(err.violation(), Some(ViolationKind::TooLong));

    // eight multi-byte characters
    let mut req = get("/items/1?limit=1&q=%C3%A9%C3%A9%C3%A9%C3%A9%C3%A9%C3%A9%C3%A9%C3%A9");
    let item = registry.bind_new::<GetItem>(&mut req, &params).unwrap();
    assert_eq!(item.search.chars().count(), 8);
}

#[test]
fn test_strict_conversion_failure() {
    let registry = registry();
    let mut req = get("/items/x?limit=ten");
    let err = registry
        .bind_new::<GetItem>(&mut req, &path_params(&[("id", "7")]))
        .unwrap_err();
    assert_eq!(err.param(), "limit");
    assert!(matches!(
        err.kind(),
        BindErrorKind::Conversion(ConvertError::Invalid { .. })
    ));
}

#[test]
fn test_form_binding_and_regexp() {
    let registry = registry();
    let mut req = form_post("/signup", "login=ann_01&age=30&newsletter=on");
    let signup: Signup = registry.bind_new(&mut req, &path_params(&[])).unwrap();
    assert_eq!(signup.login, "ann_01");
    assert_eq!(signup.age, 30);
    assert!(signup.newsletter);

    let mut req = form_post("/signup", "login=Ann&age=30");
    let err = registry
        .bind_new::<Signup>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert_eq!(err.violation(), Some(ViolationKind::NotMatching));
}

#[test]
fn test_custom_error_replaces_message() {
    let registry = registry();
    for form in ["login=ann&age=7", "login=ann&age=old", "login=ann"] {
        let mut req = form_post("/signup", form);
        let err = registry
            .bind_new::<Signup>(&mut req, &path_params(&[]))
            .unwrap_err();
        assert_eq!(err.param(), "age");
        assert_eq!(err.custom_message(), Some("age must be between 13 and 130"));
        assert_eq!(err.to_string(), "age must be between 13 and 130");
    }
}

#[test]
fn test_form_too_large_is_request_error() {
    let registry = Registry::new(parambind::BindConfig {
        default_max_memory: 16,
        ..Default::default()
    });
    registry.register::<Signup>().unwrap();
    let mut req = form_post("/signup", "login=ann&age=30&newsletter=true&padding=xxxxxxxx");
    let err = registry
        .bind_new::<Signup>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::Request(_)));
}

#[test]
fn test_nested_flattened_and_composite_fields() {
    let registry = registry();
    let mut req = get(
        "/search?user.name=ann&user[years]=30&user.name=bob&page=2&per_page=50\
         &filters[color]=red&filters[size]=m&ids[1]=20&ids[0]=10",
    );
    let search: Search = registry.bind_new(&mut req, &path_params(&[])).unwrap();

    assert_eq!(search.user.name, "ann");
    assert_eq!(search.user.age, 30);
    assert_eq!(search.paging.page, 2);
    assert_eq!(search.paging.per_page, 50);
    assert_eq!(search.filters.get("color").map(String::as_str), Some("red"));
    assert_eq!(search.filters.get("size").map(String::as_str), Some("m"));
    assert_eq!(search.ids, vec![10, 20]);
    assert!(search.internal.is_empty());

    let api = registry.get::<Search>().unwrap();
    let names: Vec<&str> = api.params().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["user", "page", "per_page", "filters", "ids"]);
    assert_eq!(api.params()[2].field_path(), &[1, 1]);
}

#[test]
fn test_array_index_limit_is_strict() {
    let registry = registry();
    let mut req = get("/search?ids[5000]=1");
    let err = registry
        .bind_new::<Search>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert_eq!(err.param(), "ids");
    assert!(matches!(
        err.kind(),
        BindErrorKind::Conversion(ConvertError::IndexTooLarge { .. })
    ));
}

#[test]
fn test_body_json_and_missing() {
    let registry = registry();
    let mut req = json_post("/owners/ann/pets", r#"{"name":"rex","tags":["dog"]}"#);
    let created: CreatePet = registry
        .bind_new(&mut req, &path_params(&[("owner", "ann")]))
        .unwrap();
    assert_eq!(created.owner, "ann");
    assert_eq!(
        created.pet.into_inner(),
        NewPet {
            name: "rex".into(),
            tags: vec!["dog".into()]
        }
    );

    let mut req = json_post("/owners/ann/pets", "");
    let err = registry
        .bind_new::<CreatePet>(&mut req, &path_params(&[("owner", "ann")]))
        .unwrap_err();
    assert_eq!(err.kind(), &BindErrorKind::Missing(Position::Body));

    let mut req = json_post("/owners/ann/pets", "{not json");
    let err = registry
        .bind_new::<CreatePet>(&mut req, &path_params(&[("owner", "ann")]))
        .unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::Request(_)));
}

#[test]
fn test_body_with_yaml_decoder() {
    let registry = Registry::default();
    registry
        .register_with::<CreatePet>(RegisterOptions::default().with_body_decoder(yaml_decoder()))
        .unwrap();
    let mut req = json_post("/owners/bo/pets", "name: tom\ntags: [cat]\n");
    let created: CreatePet = registry
        .bind_new(&mut req, &path_params(&[("owner", "bo")]))
        .unwrap();
    assert_eq!(created.pet.name, "tom");
    assert_eq!(created.pet.tags, vec!["cat"]);
}

#[test]
fn test_multipart_files() {
    let registry = registry();
    let form = MultipartForm {
        values: [("title", "holiday")].into_iter().collect(),
        files: vec![
            UploadedFile::new("avatar", "me.png", vec![1, 2, 3]),
            UploadedFile::new("attachments", "a.txt", b"a".to_vec()),
            UploadedFile::new("attachments", "b.txt", b"b".to_vec()),
        ],
    };
    let mut req = multipart_post("/upload", form);
    let upload: Upload = registry.bind_new(&mut req, &path_params(&[])).unwrap();

    assert_eq!(upload.avatar.file_name, "me.png");
    assert_eq!(upload.avatar.size(), 3);
    let names: Vec<&str> = upload
        .attachments
        .iter()
        .map(|f| f.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(upload.title, "holiday");

    let api = registry.get::<Upload>().unwrap();
    assert_eq!(api.max_memory(), 1 << 20);
    assert!(api.params()[0].is_file());
}

#[test]
fn test_multipart_over_limit() {
    let registry = registry();
    let form = MultipartForm {
        values: Default::default(),
        files: vec![UploadedFile::new("avatar", "big.bin", vec![0; 2 << 20])],
    };
    let mut req = multipart_post("/upload", form);
    let err = registry
        .bind_new::<Upload>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert!(matches!(err.kind(), BindErrorKind::Request(_)));
}

#[test]
fn test_cookie_and_nonzero_header() {
    let registry = registry();
    let mut req = get_with_headers(
        "/",
        &[("cookie", "sid=s3cret"), ("x-trace", "a"), ("x-trace", "b")],
    );
    let session: Session = registry.bind_new(&mut req, &path_params(&[])).unwrap();
    assert_eq!(session.sid, Cookie::new("sid", "s3cret"));
    assert_eq!(session.trace, vec!["a", "b"]);

    let mut req = get_with_headers("/", &[("cookie", "sid=s3cret"), ("x-trace", "")]);
    let err = registry
        .bind_new::<Session>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert_eq!(err.param(), "X-Trace");
    assert_eq!(err.violation(), Some(ViolationKind::NotSet));
}

#[test]
fn test_bind_at_keeps_absent_fields() {
    let registry = registry();
    let mut dest = Search {
        paging: Paging {
            page: 1,
            per_page: 25,
        },
        ..Default::default()
    };
    let mut req = get("/search?page=3");
    registry
        .bind_at(&mut dest, &mut req, &path_params(&[]))
        .unwrap();
    assert_eq!(dest.paging.page, 3);
    assert_eq!(dest.paging.per_page, 25);
}

#[test]
fn test_unregistered_type() {
    let registry = Registry::default();
    let mut req = get("/search");
    let err = registry
        .bind_new::<Search>(&mut req, &path_params(&[]))
        .unwrap_err();
    assert_eq!(err.kind(), &BindErrorKind::NotRegistered);
}

#[test]
fn test_register_template_captures_examples() {
    let registry = Registry::default();
    let template = Signup {
        login: "ann".into(),
        age: 42,
        newsletter: true,
    };
    let api = registry
        .register_template(&template, RegisterOptions::default())
        .unwrap();
    let examples: Vec<_> = api.params().iter().map(|p| p.example().cloned()).collect();
    assert_eq!(
        examples,
        vec![Some(json!("ann")), Some(json!(42)), Some(json!(true))]
    );
    assert_eq!(registry.get_by_name("Signup").unwrap().number(), 3);
}

#[test]
fn test_custom_name_mapper() {
    let registry = Registry::default();
    let api = registry
        .register_with::<Paging>(
            RegisterOptions::default().with_name_mapper(|field| field.replace('_', "-")),
        )
        .unwrap();
    assert_eq!(api.params()[1].name(), "per-page");

    let mut req = get("/?page=4&per-page=9");
    let paging: Paging = registry.bind_new(&mut req, &path_params(&[])).unwrap();
    assert_eq!(paging.per_page, 9);
}

#[test]
fn test_reregistration_replaces() {
    let registry = Registry::default();
    registry.register::<Paging>().unwrap();
    registry.register::<Paging>().unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get::<Paging>().unwrap().name(), "Paging");
}
