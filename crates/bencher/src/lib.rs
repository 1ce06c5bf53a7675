use http::Method;

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    request: TestRequest,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, request: TestRequest) -> Self {
        Self { name, group, request }
    }

    pub fn found(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Found, request)
    }

    pub fn redirect(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Redirect, request)
    }

    pub fn miss(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Miss, request)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn request(&self) -> &TestRequest {
        &self.request
    }
}

/// The request line a lookup benchmark runs against.
#[derive(Debug, Clone)]
pub struct TestRequest {
    host: &'static str,
    method: Method,
    path: &'static str,
}

impl TestRequest {
    pub fn new(host: &'static str, method: Method, path: &'static str) -> Self {
        Self { host, method, path }
    }

    pub fn get(host: &'static str, path: &'static str) -> Self {
        Self::new(host, Method::GET, path)
    }

    pub fn host(&self) -> &'static str {
        self.host
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Found,
    Redirect,
    Miss,
}
