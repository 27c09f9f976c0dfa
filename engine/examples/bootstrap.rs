//! Bootstraps an engine and calls a route handler whose parameters are
//! resolved through contextual attributes.

use std::collections::HashMap;
use std::sync::Arc;

use engine::prelude::*;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use parking_lot::Mutex;

// === Subsystems ===

struct FileLogger {
    channel: String,
}

impl FileLogger {
    fn info(&self, message: &str) {
        println!("[{}] {message}", self.channel);
    }
}

#[derive(Default)]
struct LogManager {
    channels: Mutex<HashMap<String, Service>>,
}

impl NamedRegistry for LogManager {
    fn load(&self, key: &str) -> std::result::Result<Service, BoxError> {
        let mut channels = self.channels.lock();
        let channel = channels
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(FileLogger { channel: key.to_string() }) as Service);
        Ok(Arc::clone(channel))
    }
}

struct User {
    name: String,
}

struct SessionAuth;

impl AuthService for SessionAuth {
    fn user(&self) -> Option<Service> {
        Some(Arc::new(User { name: "amira".to_string() }) as Service)
    }
}

// === Application services ===

struct Greeter {
    logger: Arc<FileLogger>,
    greeting: String,
}

impl Injectable for Greeter {
    fn signature() -> Signature {
        Signature::new()
            .param(Param::untyped("logger").attribute(Log::key("app")))
            .param(Param::untyped("greeting").attribute(Config::new("app.greeting")))
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Greeter {
            logger: args.shared("logger")?,
            greeting: args.value::<Option<String>>("greeting")?.unwrap_or_else(|| "Hello".to_string()),
        })
    }
}

struct GreeterProvider;

impl Provider for GreeterProvider {
    fn register(&self, container: &Container) {
        container.singleton_injectable::<Greeter>();
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    engine::logging::init("info,engine=debug");

    let engine = Arc::new(
        Engine::builder()
            .config(
                Figment::new()
                    .merge(Toml::string("[app]\ngreeting = \"Welcome\"\n\n[container]\nmax_depth = 32"))
                    .merge(Env::prefixed("ENGINE_").split("__")),
            )
            .registry(Subsystem::Log, LogManager::default())
            .auth(SessionAuth)
            .request(MatchedRoute::new("/posts/{id}").argument("id", "7"))
            .provider(GreeterProvider)
            .build()?,
    );
    Engine::set_instance(Arc::clone(&engine));

    let show_post = Callable::new(|args: &Arguments| {
        let greeter = args.get::<Arc<Greeter>>("greeter")?;
        let user = args.shared::<User>("user")?;
        let id: u64 = args.value("id")?;

        greeter.logger.info(&format!("{}, {}! Showing post #{id}", greeter.greeting, user.name));
        Ok(id)
    })
    .param(Param::injectable::<Greeter>("greeter"))
    .param(Param::untyped("user").attribute(CurrentUser))
    .param(Param::untyped("id").attribute(RouteArgument::new("id")));

    let app = engine::app().ok_or("engine not installed")?;
    let id = app.call(&show_post, Overrides::new())?;
    println!("handled post {id}");

    engine.set_request(MatchedRoute::new("/posts/{id}").argument("id", "8"));
    let id = app.call(&show_post, Overrides::new())?;
    println!("handled post {id}");

    Engine::clear_instance();
    Ok(())
}
