#![allow(dead_code)]

use parambind::{BindRequest, MultipartForm, PathParams};
use std::sync::Arc;

/// Request builders shared by the integration tests.
pub mod http_helpers {
    use super::*;

    pub fn get(uri: &str) -> BindRequest {
        request("GET", uri, None, Vec::new())
    }

    pub fn get_with_headers(uri: &str, headers: &[(&str, &str)]) -> BindRequest {
        let mut builder = http::Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        BindRequest::new(builder.body(Vec::new()).unwrap())
    }

    pub fn form_post(uri: &str, form: &str) -> BindRequest {
        request(
            "POST",
            uri,
            Some("application/x-www-form-urlencoded"),
            form.as_bytes().to_vec(),
        )
    }

    pub fn json_post(uri: &str, body: &str) -> BindRequest {
        request(
            "POST",
            uri,
            Some("application/json"),
            body.as_bytes().to_vec(),
        )
    }

    pub fn multipart_post(uri: &str, form: MultipartForm) -> BindRequest {
        request("POST", uri, Some("multipart/form-data; boundary=x"), Vec::new())
            .with_multipart(form)
    }

    pub fn request(method: &str, uri: &str, content_type: Option<&str>, body: Vec<u8>) -> BindRequest {
        let mut builder = http::Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        BindRequest::new(builder.body(body).unwrap())
    }
}

/// Build path parameters the way a router hands them over.
pub fn path_params(pairs: &[(&str, &str)]) -> PathParams {
    pairs
        .iter()
        .map(|(k, v)| (Arc::from(*k), (*v).to_string()))
        .collect()
}
