use http::uri::Scheme;
use http::{Method, StatusCode};
use micro_dispatch::{
    action_fn, ActionDescriptor, Application, ControllerDescriptor, ControllerRegistry, Prepared, RequestInfo, TypeTag,
};
use micro_router::{DomainConfig, RouteConfig, RoutingConfig};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn controllers() -> ControllerRegistry {
    let base = ControllerDescriptor::new("Base").action(ActionDescriptor::new("Index").handler(action_fn(|ctx| {
        ctx.reply_mut().text("welcome\r\n");
        Ok(())
    })));

    let user = ControllerDescriptor::new("User")
        .embed(0, "Base")
        .action(ActionDescriptor::new("Show").param("id", TypeTag::Int).handler(action_fn(|ctx| {
            let id: i64 = ctx.param("id").unwrap_or_default().parse()?;
            let home = ctx.reverse_url("home", Vec::<String>::new())?;
            ctx.reply_mut().json(&serde_json::json!({ "id": id, "home": home }))?;
            Ok(())
        })))
        .action(ActionDescriptor::new("Delete").handler(action_fn(|ctx| {
            ctx.reply_mut().status(StatusCode::NO_CONTENT);
            Ok(())
        })));

    match ControllerRegistry::builder().base_type("Base").register(base).register(user).build() {
        Ok(registry) => registry,
        Err(e) => panic!("invalid controllers: {e}"),
    }
}

fn routing() -> RoutingConfig {
    RoutingConfig::new().domain(
        "main",
        DomainConfig::new("localhost").port(8080).default_domain().route("home", RouteConfig::new("/").controller("Base")).route(
            "user",
            RouteConfig::new("/users/:id")
                .controller("User")
                .action("Show")
                .route("delete_user", RouteConfig::new("/").method("DELETE").action("Delete")),
        ),
    )
}

#[tokio::main]
async fn main() {
    let dispatch = tracing::Dispatch::new(FmtSubscriber::builder().with_max_level(Level::DEBUG).finish());
    if let Err(e) = tracing::dispatcher::set_global_default(dispatch.clone()) {
        eprintln!("failed to install subscriber: {e}");
    }

    let app = match Application::builder()
        .routing(routing())
        .controllers(controllers())
        .log_dispatch(dispatch)
        .build()
    {
        Ok(app) => app,
        Err(e) => {
            error!(cause = %e, "failed to build application");
            return;
        }
    };

    let requests = [
        (Method::GET, "/"),
        (Method::GET, "/users/42"),
        (Method::GET, "/users/42/"),
        (Method::DELETE, "/users/42/"),
        (Method::OPTIONS, "/users/42/"),
        (Method::POST, "/users/42"),
        (Method::GET, "/missing"),
    ];

    info!(domains = app.routing().domains().domains().len(), "application ready");

    for (method, path) in requests {
        let request = RequestInfo { scheme: Scheme::HTTP, host: "localhost:8080", method: method.clone(), path };
        match app.prepare(request) {
            Ok(Prepared::Dispatch(mut ctx)) => match app.invoke(&mut ctx).await {
                Ok(()) => {
                    let reply = ctx.reply();
                    println!(
                        "{method} {path} -> {} {}",
                        reply.status_code(),
                        String::from_utf8_lossy(reply.body_bytes())
                    );
                }
                Err(e) => error!(%method, path, cause = %e, "action failed"),
            },
            Ok(Prepared::Redirect(redirect)) => println!("{method} {path} -> {} {}", redirect.status, redirect.path),
            Ok(Prepared::MethodNotAllowed(allowed)) => println!("{method} {path} -> 405 allow: {allowed}"),
            Ok(Prepared::NotFound) => println!("{method} {path} -> 404"),
            Err(e) => error!(%method, path, cause = %e, "lookup failed"),
        }
    }
}
