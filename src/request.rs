use crate::convert::{Cookie, UploadedFile};
use crate::form::FormValues;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, Method, Uri};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Route-matched path parameters, in route order, as supplied by the router.
pub type PathParams = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Look up a path parameter by name.
pub fn path_param<'a>(params: &'a PathParams, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

/// A multipart body already split into parts by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub values: FormValues,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Total payload size: text values plus file contents
    pub fn byte_size(&self) -> usize {
        self.values.byte_size() + self.files.iter().map(UploadedFile::size).sum::<usize>()
    }
}

#[derive(Debug)]
enum FormState {
    Unparsed,
    Parsed(FormValues),
    Failed(String),
}

/// The live request a binder reads from.
///
/// The query string is parsed once, the form at most once (lazily, the first
/// time a form value is needed) and the raw body is handed out at most once.
#[derive(Debug)]
pub struct BindRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    path_params: PathParams,
    multipart: Option<MultipartForm>,
    query: Option<FormValues>,
    form: FormState,
    cookies: Option<Vec<Cookie>>,
}

impl BindRequest {
    pub fn new(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: Some(body),
            path_params: PathParams::new(),
            multipart: None,
            query: None,
            form: FormState::Unparsed,
            cookies: None,
        }
    }

    /// Attach the router's path parameters.
    #[must_use]
    pub fn with_path_params(mut self, params: PathParams) -> Self {
        self.path_params = params;
        self
    }

    /// Attach a multipart body parsed by the HTTP layer.
    #[must_use]
    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.multipart = Some(form);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// All values of a header, case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect()
    }

    /// Parsed query string.
    pub fn query(&mut self) -> &FormValues {
        let uri = &self.uri;
        self.query.get_or_insert_with(|| {
            let values = FormValues::parse(uri.query().unwrap_or(""));
            debug!(param_count = values.len(), "Query params parsed");
            values
        })
    }

    /// Cookies from every `Cookie` header.
    pub fn cookies(&mut self) -> &[Cookie] {
        let headers = &self.headers;
        self.cookies.get_or_insert_with(|| {
            let cookies = parse_cookies(headers);
            debug!(cookie_count = cookies.len(), "Cookies extracted");
            cookies
        })
    }

    /// Uploaded files from the multipart body, if any.
    pub fn files(&self) -> &[UploadedFile] {
        self.multipart
            .as_ref()
            .map(|m| m.files.as_slice())
            .unwrap_or(&[])
    }

    /// Form values, parsing the body on first use.
    ///
    /// A pre-parsed multipart form is used when present. Otherwise an
    /// `application/x-www-form-urlencoded` body is consumed and decoded; any
    /// other content type yields an empty form. Payloads larger than
    /// `max_memory` bytes fail, and the failure is remembered.
    pub fn form(&mut self, max_memory: u64) -> Result<&FormValues, String> {
        self.form_with_files(max_memory).map(|(values, _)| values)
    }

    /// Form values together with the uploaded files.
    pub fn form_with_files(
        &mut self,
        max_memory: u64,
    ) -> Result<(&FormValues, &[UploadedFile]), String> {
        if let FormState::Unparsed = self.form {
            self.form = self.parse_form(max_memory);
        }
        let files = self
            .multipart
            .as_ref()
            .map(|m| m.files.as_slice())
            .unwrap_or(&[]);
        match &self.form {
            FormState::Parsed(values) => Ok((values, files)),
            FormState::Failed(reason) => Err(reason.clone()),
            FormState::Unparsed => Err("form was not parsed".to_string()),
        }
    }

    fn parse_form(&mut self, max_memory: u64) -> FormState {
        if let Some(multipart) = self.multipart.as_mut() {
            let size = multipart.byte_size() as u64;
            if size > max_memory {
                return FormState::Failed(format!(
                    "multipart form of {} bytes exceeds the limit of {} bytes",
                    size, max_memory
                ));
            }
            debug!(
                value_count = multipart.values.len(),
                file_count = multipart.files.len(),
                "Multipart form taken"
            );
            return FormState::Parsed(std::mem::take(&mut multipart.values));
        }

        if !self.is_url_encoded() {
            return FormState::Parsed(FormValues::new());
        }
        let body = self.take_body().unwrap_or_default();
        if body.len() as u64 > max_memory {
            return FormState::Failed(format!(
                "request body of {} bytes exceeds the limit of {} bytes",
                body.len(),
                max_memory
            ));
        }
        let values = FormValues::parse_bytes(&body);
        debug!(
            body_size_bytes = body.len(),
            param_count = values.len(),
            "Url-encoded form parsed"
        );
        FormState::Parsed(values)
    }

    fn is_url_encoded(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .is_some_and(|mime| {
                mime.trim()
                    .eq_ignore_ascii_case("application/x-www-form-urlencoded")
            })
    }

    /// The raw body. Only the first call returns it.
    pub fn take_body(&mut self) -> Option<Vec<u8>> {
        self.body.take()
    }
}

impl From<http::Request<Vec<u8>>> for BindRequest {
    fn from(req: http::Request<Vec<u8>>) -> Self {
        BindRequest::new(req)
    }
}

/// Parse `name=value` pairs from every `Cookie` header.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<Cookie> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some(Cookie::new(name, value))
        })
        .collect()
}
