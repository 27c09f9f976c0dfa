use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use engine::prelude::*;
use figment::Figment;
use figment::providers::{Format, Toml};
use serde_json::json;

// ── Fixtures ──

#[derive(Debug)]
struct FileLogger {
    channel: String,
}

#[derive(Debug)]
struct Store {
    name: String,
}

#[derive(Debug)]
struct User {
    id: u64,
}

/// A registry that builds one service per key on first load and counts loads.
struct Registry<F> {
    default: &'static str,
    known: &'static [&'static str],
    build: F,
    loads: AtomicUsize,
    instances: parking_lot::Mutex<HashMap<String, Service>>,
}

impl<F> Registry<F>
where
    F: Fn(&str) -> Service + Send + Sync,
{
    fn new(default: &'static str, known: &'static [&'static str], build: F) -> Self {
        Self {
            default,
            known,
            build,
            loads: AtomicUsize::new(0),
            instances: parking_lot::Mutex::new(HashMap::new()),
        }
    }
}

impl<F> NamedRegistry for Registry<F>
where
    F: Fn(&str) -> Service + Send + Sync,
{
    fn default_key(&self) -> &str {
        self.default
    }

    fn load(&self, key: &str) -> std::result::Result<Service, BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.known.contains(&key) {
            return Err(format!("config `{key}` does not exist").into());
        }
        let mut instances = self.instances.lock();
        let service = instances.entry(key.to_string()).or_insert_with(|| (self.build)(key));
        Ok(Arc::clone(service))
    }
}

fn loggers() -> Registry<impl Fn(&str) -> Service + Send + Sync> {
    Registry::new("default", &["default", "app", "audit"], |key| {
        Arc::new(FileLogger { channel: key.to_string() }) as Service
    })
}

fn stores() -> Registry<impl Fn(&str) -> Service + Send + Sync> {
    Registry::new("default", &["default", "redis"], |key| {
        Arc::new(Store { name: key.to_string() }) as Service
    })
}

struct Auth(Option<u64>);

impl AuthService for Auth {
    fn user(&self) -> Option<Service> {
        self.0.map(|id| Arc::new(User { id }) as Service)
    }
}

fn engine() -> Engine {
    Engine::builder()
        .config(Figment::new().merge(Toml::string(
            r#"
            [app]
            name = "shop"
            per_page = 25
            "#,
        )))
        .registry(Subsystem::Log, loggers())
        .registry(Subsystem::Cache, stores())
        .registry(Subsystem::Database, stores())
        .registry(Subsystem::Encryption, stores())
        .registry(Subsystem::Mail, stores())
        .registry(Subsystem::Orm, Registry::new("default", &["Users", "Posts"], |alias| {
            Arc::new(Store { name: alias.to_string() }) as Service
        }))
        .auth(Auth(Some(7)))
        .request(MatchedRoute::new("/users/{id}").argument("id", "1").argument("slug", "first-post"))
        .build()
        .unwrap()
}

fn read_store(param: Param) -> Result<String> {
    engine().call(
        &Callable::new(|args: &Arguments| Ok(args.shared::<Store>("store")?.name.clone())).param(param),
        Overrides::new(),
    )
}

// ── Named registries ──

#[test]
fn log_attribute_loads_keyed_channel() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.shared::<FileLogger>("logger"))
        .param(Param::untyped("logger").attribute(Log::key("app")));

    let logger = engine.call(&action, Overrides::new()).unwrap();
    assert_eq!(logger.channel, "app");
}

#[test]
fn log_attribute_without_key_uses_registry_default() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.shared::<FileLogger>("logger"))
        .param(Param::untyped("logger").attribute(Log::new()));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap().channel, "default");
}

#[test]
fn attribute_returns_the_registry_shared_instance() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.shared::<FileLogger>("logger"))
        .param(Param::untyped("logger").attribute(Log::key("app")));

    let first = engine.call(&action, Overrides::new()).unwrap();
    let second = engine.call(&action, Overrides::new()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn attribute_asks_the_registry_on_every_resolution() {
    let registry = Arc::new(loggers());
    let engine = Engine::builder().build().unwrap();
    let handle: RegistryHandle = registry.clone();
    engine.instance_named(Subsystem::Log.name(), handle);

    let action = Callable::new(|args: &Arguments| args.shared::<FileLogger>("logger"))
        .param(Param::untyped("logger").attribute(Log::new()));
    engine.call(&action, Overrides::new()).unwrap();
    engine.call(&action, Overrides::new()).unwrap();

    assert_eq!(registry.loads.load(Ordering::SeqCst), 2);
}

#[test]
fn cache_db_encryption_and_mail_attributes() {
    assert_eq!(read_store(Param::untyped("store").attribute(Cache::key("redis"))).unwrap(), "redis");
    assert_eq!(read_store(Param::untyped("store").attribute(Db::new())).unwrap(), "default");
    assert_eq!(read_store(Param::untyped("store").attribute(Encryption::new())).unwrap(), "default");
    assert_eq!(read_store(Param::untyped("store").attribute(Mail::key("redis"))).unwrap(), "redis");
}

#[test]
fn attributes_resolve_to_the_registry_instance() {
    let engine = engine();
    let direct = |subsystem: Subsystem, key: &str| -> Service {
        let registry: RegistryHandle = engine.resolve_named(subsystem.name()).unwrap();
        registry.load(key).unwrap()
    };

    let cases = vec![
        (Subsystem::Cache, Param::untyped("s").attribute(Cache::key("redis")), "redis"),
        (Subsystem::Cache, Param::untyped("s").attribute(Cache::new()), "default"),
        (Subsystem::Database, Param::untyped("s").attribute(Db::key("redis")), "redis"),
        (Subsystem::Database, Param::untyped("s").attribute(Db::new()), "default"),
        (Subsystem::Encryption, Param::untyped("s").attribute(Encryption::key("redis")), "redis"),
        (Subsystem::Encryption, Param::untyped("s").attribute(Encryption::new()), "default"),
        (Subsystem::Log, Param::untyped("s").attribute(Log::key("audit")), "audit"),
        (Subsystem::Log, Param::untyped("s").attribute(Log::new()), "default"),
        (Subsystem::Mail, Param::untyped("s").attribute(Mail::key("redis")), "redis"),
        (Subsystem::Mail, Param::untyped("s").attribute(Mail::new()), "default"),
        (Subsystem::Orm, Param::untyped("s").attribute(Orm::new("Posts")), "Posts"),
    ];

    for (subsystem, param, key) in cases {
        let action = Callable::new(|args: &Arguments| match args.resolved("s") {
            Some(Resolved::Shared(service)) => Ok(Arc::clone(service)),
            other => panic!("expected a shared service, got {other:?}"),
        })
        .param(param);

        let resolved = engine.call(&action, Overrides::new()).unwrap();
        assert!(Arc::ptr_eq(&resolved, &direct(subsystem, key)), "{subsystem} `{key}`");
    }
}

#[test]
fn orm_attribute_loads_model_by_alias() {
    assert_eq!(read_store(Param::untyped("store").attribute(Orm::new("Users"))).unwrap(), "Users");
}

#[test]
fn registry_errors_propagate_unchanged() {
    let err = read_store(Param::untyped("store").attribute(Cache::key("memcached"))).unwrap_err();

    assert!(matches!(err, ContainerError::Service(_)));
    assert_eq!(err.to_string(), "config `memcached` does not exist");
}

#[test]
fn missing_registry_is_unresolvable() {
    let engine = Engine::builder().build().unwrap();
    let action = Callable::new(|args: &Arguments| args.shared::<Store>("store"))
        .param(Param::untyped("store").attribute(Cache::new()));

    let err = engine.call(&action, Overrides::new()).unwrap_err();
    assert!(matches!(err, ContainerError::UnresolvableDependency(_)));
}

// ── Config, current user, route arguments ──

#[test]
fn config_attribute_reads_dotted_key() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| {
        Ok((args.value::<String>("name")?, args.value::<u32>("per_page")?))
    })
    .param(Param::untyped("name").attribute(Config::new("app.name")))
    .param(Param::untyped("per_page").attribute(Config::new("app.per_page")));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), ("shop".to_string(), 25));
}

#[test]
fn absent_config_key_resolves_to_null() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.value::<Option<String>>("locale"))
        .param(Param::untyped("locale").attribute(Config::new("app.locale")));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), None);
}

#[test]
fn current_user_attribute() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| Ok(args.optional_shared::<User>("user")?.map(|u| u.id)))
        .param(Param::untyped("user").attribute(CurrentUser));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), Some(7));
}

#[test]
fn guest_resolves_to_null() {
    let engine = Engine::builder().auth(Auth(None)).build().unwrap();
    let action = Callable::new(|args: &Arguments| args.optional_shared::<User>("user"))
        .param(Param::untyped("user").attribute(CurrentUser));

    assert!(engine.call(&action, Overrides::new()).unwrap().is_none());
}

#[test]
fn route_argument_is_coerced_to_declared_type() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| Ok((args.value::<u64>("id")?, args.value::<String>("slug")?)))
        .param(Param::untyped("id").attribute(RouteArgument::new("id")))
        .param(Param::untyped("slug").attribute(RouteArgument::new("slug")));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), (1, "first-post".to_string()));
}

#[test]
fn absent_route_argument_resolves_to_null() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| Ok(args.resolved("page").is_some_and(Resolved::is_null)))
        .param(Param::untyped("page").attribute(RouteArgument::new("page")));

    assert!(engine.call(&action, Overrides::new()).unwrap());
}

#[test]
fn route_argument_follows_the_current_request() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.value::<u64>("id"))
        .param(Param::untyped("id").attribute(RouteArgument::new("id")));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), 1);

    engine.set_request(MatchedRoute::new("/users/{id}").argument("id", json!(42)));
    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), 42);
}

#[test]
fn zero_padded_route_argument_reads_as_integer() {
    let engine = engine();
    engine.set_request(MatchedRoute::new("/posts/{id}").argument("id", "007"));
    let action = Callable::new(|args: &Arguments| Ok((args.value::<u64>("id")?, args.value::<String>("id")?)))
        .param(Param::untyped("id").attribute(RouteArgument::new("id")));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), (7, "007".to_string()));
}

#[test]
fn null_text_route_argument_is_not_absent() {
    let engine = engine();
    engine.set_request(MatchedRoute::new("/tags/{tag}").argument("tag", "null"));
    let as_text = Callable::new(|args: &Arguments| args.value::<Option<String>>("tag"))
        .param(Param::untyped("tag").attribute(RouteArgument::new("tag")));
    let as_number = Callable::new(|args: &Arguments| args.value::<Option<i64>>("tag"))
        .param(Param::untyped("tag").attribute(RouteArgument::new("tag")));

    assert_eq!(engine.call(&as_text, Overrides::new()).unwrap().as_deref(), Some("null"));
    assert!(matches!(
        engine.call(&as_number, Overrides::new()),
        Err(ContainerError::TypeMismatch { .. })
    ));
}

// ── Mechanism ──

#[test]
fn same_type_parameters_with_different_attributes() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| {
        let app = args.shared::<FileLogger>("app")?;
        let audit = args.shared::<FileLogger>("audit")?;
        Ok((app.channel.clone(), audit.channel.clone()))
    })
    .param(Param::untyped("app").attribute(Log::key("app")))
    .param(Param::untyped("audit").attribute(Log::key("audit")));

    assert_eq!(
        engine.call(&action, Overrides::new()).unwrap(),
        ("app".to_string(), "audit".to_string())
    );
}

#[test]
fn explicit_argument_wins_over_attribute() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.value::<String>("name"))
        .param(Param::untyped("name").attribute(Config::new("app.name")));

    let name = engine
        .call(&action, Overrides::new().value("name", json!("outlet")))
        .unwrap();
    assert_eq!(name, "outlet");
}

#[test]
fn attribute_result_takes_precedence_over_default() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.value::<Option<String>>("locale"))
        .param(Param::untyped("locale").attribute(Config::new("app.locale")).default_json(json!("en")));

    assert_eq!(engine.call(&action, Overrides::new()).unwrap(), None);
}

#[test]
fn two_attributes_on_one_parameter_are_rejected() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.shared::<FileLogger>("logger"))
        .param(Param::untyped("logger").attribute(Log::new()).attribute(Cache::new()));

    let err = engine.call(&action, Overrides::new()).unwrap_err();
    let ContainerError::InvalidAttributeUsage(invalid) = err else {
        panic!("expected InvalidAttributeUsage, got {err:?}");
    };
    assert_eq!(invalid.parameter, "logger");
    assert_eq!(invalid.attributes, vec!["Log".to_string(), "Cache".to_string()]);
}

#[test]
fn blank_keys_are_invalid_usage() {
    let engine = engine();
    for attribute in [
        Param::untyped("x").attribute(Config::new("")),
        Param::untyped("x").attribute(Log::key(" ")),
        Param::untyped("x").attribute(Orm::new("")),
        Param::untyped("x").attribute(RouteArgument::new("")),
    ] {
        let action = Callable::new(|_: &Arguments| Ok(())).param(attribute);
        let err = engine.call(&action, Overrides::new()).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidAttributeUsage(_)), "{err}");
    }
}

#[test]
fn reading_a_service_as_the_wrong_type_is_a_mismatch() {
    let engine = engine();
    let action = Callable::new(|args: &Arguments| args.shared::<Store>("logger"))
        .param(Param::untyped("logger").attribute(Log::key("app")));

    let err = engine.call(&action, Overrides::new()).unwrap_err();
    assert!(matches!(err, ContainerError::TypeMismatch { .. }));
}

// ── End to end ──

trait Logger: Send + Sync {
    fn channel(&self) -> &str;
}

impl Logger for FileLogger {
    fn channel(&self) -> &str {
        &self.channel
    }
}

struct Mailer {
    logger: Arc<FileLogger>,
    from: String,
}

impl Injectable for Mailer {
    fn signature() -> Signature {
        Signature::new()
            .param(Param::untyped("logger").attribute(Log::key("app")))
            .param(Param::untyped("from").attribute(Config::new("mail.from")))
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Mailer {
            logger: args.shared("logger")?,
            from: args.value::<Option<String>>("from")?.unwrap_or_default(),
        })
    }
}

#[test]
fn injectable_constructor_uses_attributes() {
    let engine = engine();
    engine.singleton_injectable::<Mailer>();

    let mailer: Arc<Mailer> = engine.resolve().unwrap();
    assert_eq!(mailer.logger.channel, "app");
    assert_eq!(mailer.from, "");

    let again: Arc<Mailer> = engine.resolve().unwrap();
    assert!(Arc::ptr_eq(&mailer, &again));
}

#[test]
fn singleton_bound_through_attribute_resolved_service() {
    let engine = engine();
    engine.singleton::<Arc<dyn Logger>>(|resolver| {
        let args = resolver.resolve_signature(
            &Signature::new().param(Param::untyped("logger").attribute(Log::key("app"))),
            Overrides::new(),
        )?;
        Ok(args.shared::<FileLogger>("logger")? as Arc<dyn Logger>)
    });

    let first: Arc<dyn Logger> = engine.resolve().unwrap();
    let second: Arc<dyn Logger> = engine.resolve().unwrap();

    assert_eq!(first.channel(), "app");
    assert!(Arc::ptr_eq(&first, &second));
}
