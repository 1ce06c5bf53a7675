use bencher::{TestCase, TestFile, TestRequest};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http::uri::Scheme;
use http::Method;
use micro_dispatch::{ActionDescriptor, Application, ControllerDescriptor, ControllerRegistry, Prepared, RequestInfo};
use micro_router::{DomainRegistry, RoutingConfig};
use std::hint::black_box;

static ROUTES: TestFile = TestFile::new("routes.json", include_str!("../resources/routes.json"));

fn routing_config() -> RoutingConfig {
    serde_json::from_str(ROUTES.content()).expect("routes.json should be a valid routing config")
}

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::found("static_root", TestRequest::get("example.com", "/")),
        TestCase::found("static_segment", TestRequest::get("example.com", "/about")),
        TestCase::found("named_params", TestRequest::get("example.com", "/users/42/posts/7")),
        TestCase::found("wildcard", TestRequest::get("example.com", "/doc/v1/guide/routing/params.html")),
        TestCase::found("api_host", TestRequest::get("api.example.com", "/v1/users/42")),
        TestCase::found("wildcard_host", TestRequest::get("acme.example.com", "/")),
        TestCase::redirect("trailing_slash", TestRequest::new("example.com", Method::PUT, "/users/42")),
        TestCase::miss("method_not_allowed", TestRequest::new("example.com", Method::DELETE, "/users/42/")),
        TestCase::miss("not_found", TestRequest::get("example.com", "/users/42/missing")),
    ]
}

fn controllers() -> ControllerRegistry {
    ControllerRegistry::builder()
        .register(
            ControllerDescriptor::new("Site")
                .action(ActionDescriptor::new("Index"))
                .action(ActionDescriptor::new("About"))
                .action(ActionDescriptor::new("Doc")),
        )
        .register(ControllerDescriptor::new("Base").action(ActionDescriptor::new("Index")))
        .register(
            ControllerDescriptor::new("User")
                .embed(0, "Base")
                .action(ActionDescriptor::new("Create"))
                .action(ActionDescriptor::new("Show"))
                .action(ActionDescriptor::new("Update")),
        )
        .register(ControllerDescriptor::new("Post").embed(0, "Base").action(ActionDescriptor::new("Show")))
        .register(ControllerDescriptor::new("Comment").embed(0, "Base"))
        .build()
        .expect("controllers should be valid")
}

fn benchmark_domain_lookup(criterion: &mut Criterion) {
    let registry = DomainRegistry::load(&routing_config()).expect("routes.json should load");
    let mut group = criterion.benchmark_group("domain_lookup");

    for case in create_test_cases() {
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let request = case.request();
            b.iter(|| {
                let (domain, outcome) =
                    registry.lookup(black_box(request.host()), request.method(), black_box(request.path())).unwrap();
                black_box((domain.id(), outcome.is_found()));
            });
        });
    }

    group.finish();
}

fn benchmark_prepare(criterion: &mut Criterion) {
    let app = Application::builder()
        .routing(routing_config())
        .controllers(controllers())
        .build()
        .expect("application should build");
    let mut group = criterion.benchmark_group("prepare");

    for case in create_test_cases() {
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let request = case.request();
            b.iter(|| {
                let info = RequestInfo {
                    scheme: Scheme::HTTP,
                    host: black_box(request.host()),
                    method: request.method().clone(),
                    path: black_box(request.path()),
                };
                match app.prepare(info).unwrap() {
                    Prepared::Dispatch(ctx) => black_box(ctx.target().is_some()),
                    other => black_box(matches!(other, Prepared::Redirect(_))),
                }
            });
        });
    }

    group.finish();
}

criterion_group!(lookup, benchmark_domain_lookup, benchmark_prepare);
criterion_main!(lookup);
