mod common;

use common::http_helpers::{form_post, get, get_with_headers, multipart_post};
use common::path_params;
use parambind::{AdHocBinder, BindConfig, Bindable, MultipartForm, UploadedFile};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default, PartialEq, Bindable)]
pub struct Point {
    #[param]
    pub x: i32,
    #[param]
    pub y: i32,
}

#[test]
fn test_scalar_first_value_wins() {
    let mut req = get("/?n=1&n=2");
    let mut n = 0u8;
    assert!(req.bind_one(&mut n, "n").unwrap());
    assert_eq!(n, 1);
}

#[test]
fn test_indexed_list_with_unindexed_tail() {
    let mut req = get("/?list[2]=c&list[]=x&list[0]=a&list[1]=b&list[]=y");
    let mut list: Vec<String> = Vec::new();
    req.bind_one(&mut list, "list").unwrap();
    assert_eq!(list, vec!["a", "b", "c", "x", "y"]);
}

#[test]
fn test_gaps_are_zero_filled() {
    let mut req = get("/?ids[3]=30&ids[0]=1");
    let mut ids: Vec<u32> = Vec::new();
    req.bind_one(&mut ids, "ids").unwrap();
    assert_eq!(ids, vec![1, 0, 0, 30]);
}

#[test]
fn test_lenient_elements_and_index_limit() {
    let binder = AdHocBinder::new(BindConfig {
        max_array_index: 4,
        ..BindConfig::default()
    });
    let mut req = get("/?ids[0]=7&ids[1]=oops&ids[9]=9");
    let mut ids: Vec<i64> = Vec::new();
    assert!(binder.bind_one(&mut req, &mut ids, "ids").unwrap());
    assert_eq!(ids, vec![7, 0]);
}

#[test]
fn test_maps() {
    let mut req = get("/?m[a]=1&m[b]=2&m[a]=3");
    let mut m: HashMap<String, u32> = HashMap::new();
    req.bind_one(&mut m, "m").unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m["a"], 1);
    assert_eq!(m["b"], 2);

    let mut req = get("/?scores[1]=10&scores[2]=20");
    let mut scores: BTreeMap<u8, u8> = BTreeMap::new();
    req.bind_one(&mut scores, "scores").unwrap();
    assert_eq!(scores.into_iter().collect::<Vec<_>>(), vec![(1, 10), (2, 20)]);
}

#[test]
fn test_nested_records_and_record_lists() {
    let mut req = get("/?p.x=1&p[y]=2&pts[1].x=3&pts[0][y]=4");
    let mut p = Point::default();
    req.bind_one(&mut p, "p").unwrap();
    assert_eq!(p, Point { x: 1, y: 2 });

    let mut pts: Vec<Point> = Vec::new();
    req.bind_one(&mut pts, "pts").unwrap();
    assert_eq!(pts, vec![Point { x: 0, y: 4 }, Point { x: 3, y: 0 }]);
}

#[test]
fn test_option_and_box() {
    let mut req = get("/?limit=5");
    let mut limit: Option<u16> = None;
    assert!(req.bind_one(&mut limit, "limit").unwrap());
    assert_eq!(limit, Some(5));

    let mut boxed: Box<String> = Box::default();
    assert!(!req.bind_one(&mut boxed, "absent").unwrap());
    assert!(boxed.is_empty());
}

#[test]
fn test_path_form_query_priority() {
    let mut req = form_post("/users/9?id=3&tag=q", "id=8&tag=f")
        .with_path_params(path_params(&[("id", "9")]));
    let mut ids: Vec<u32> = Vec::new();
    req.bind_one(&mut ids, "id").unwrap();
    assert_eq!(ids, vec![9, 8, 3]);

    let mut tag = String::new();
    req.bind_one(&mut tag, "tag").unwrap();
    assert_eq!(tag, "f");
}

#[test]
fn test_unreadable_form_is_ignored() {
    let binder = AdHocBinder::new(BindConfig {
        default_max_memory: 4,
        ..BindConfig::default()
    });
    let mut req = form_post("/?q=kept", "q=from-a-form-that-is-too-big");
    let mut q = String::new();
    assert!(binder.bind_one(&mut req, &mut q, "q").unwrap());
    assert_eq!(q, "kept");
}

#[test]
fn test_files_and_cookies() {
    let form = MultipartForm {
        values: [("title", "x")].into_iter().collect(),
        files: vec![UploadedFile::new("doc", "a.pdf", vec![9])],
    };
    let mut req = multipart_post("/", form);
    let mut doc = UploadedFile::default();
    assert!(req.bind_one(&mut doc, "doc").unwrap());
    assert_eq!(doc.file_name, "a.pdf");

    let mut req = get_with_headers("/", &[("cookie", "theme=\"dark\"")]);
    let mut theme = parambind::Cookie::default();
    assert!(req.bind_one(&mut theme, "theme").unwrap());
    assert_eq!(theme.value, "dark");
}

#[test]
fn test_key_values_merge_order() {
    let mut req = form_post("/?b=3", "a=2").with_path_params(path_params(&[("a", "1")]));
    let merged = AdHocBinder::default().key_values(&mut req);
    assert_eq!(merged.get("a").unwrap(), ["1", "2"]);
    assert_eq!(merged.first("b"), Some("3"));
}
