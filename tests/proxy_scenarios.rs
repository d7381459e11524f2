// tests/proxy_scenarios.rs
//! End-to-end proxy scenarios through the public API

use interpose::advice::{ProxyForwarder, TracingInterceptor};
use interpose::invocation::fault::{ErrorClass, EXCEPTION, RUNTIME_EXCEPTION};
use interpose::pointcut::MethodMapAttributeRegistry;
use interpose::transaction::{
    RuleBasedTransactionAttribute, TransactionInterceptor, TransactionManager, TransactionStatus,
};
use interpose::{
    AopError, Arguments, Capability, DelegatingIntroduction, Fault, Interceptor, Invocation,
    Method, ProxyFactory, Result, RollbackRule, SelfRef, Target, Value,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

interpose::capability! {
    pub trait Greeter as GreeterCapability = "app.Greeter" {
        fn name(&self) -> String;
        fn greet(&self, whom: String) -> String;
    }
}

interpose::capability! {
    pub trait Counter as CounterCapability = "app.Counter" {
        fn increment(&self, by: i64) -> i64;
        fn touch(&self) -> SelfRef;
    }
}

interpose::capability! {
    pub trait Account as AccountCapability = "bank.Account" {
        fn withdraw(&self, amount: i64) -> i64;
    }
}

static EJB_EXCEPTION: ErrorClass = ErrorClass::new("ejb.EJBException", &RUNTIME_EXCEPTION);
static INSUFFICIENT_FUNDS: ErrorClass = ErrorClass::new("bank.InsufficientFunds", &EXCEPTION);

/// Greeter that counts how often it is really invoked
struct Person {
    name: String,
    calls: AtomicUsize,
}

impl Person {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Greeter for Person {
    fn name(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.name.clone())
    }

    fn greet(&self, whom: String) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Hello {}, I am {}", whom, self.name))
    }
}

interpose::impl_target!(Person => GreeterCapability);

/// Greeter and counter at once, so introductions can shadow it
#[derive(Default)]
struct Clerk {
    total: AtomicI64,
}

impl Greeter for Clerk {
    fn name(&self) -> Result<String> {
        Ok("Clerk".to_string())
    }

    fn greet(&self, whom: String) -> Result<String> {
        Ok(format!("Next, {}", whom))
    }
}

impl Counter for Clerk {
    fn increment(&self, by: i64) -> Result<i64> {
        Ok(self.total.fetch_add(by, Ordering::SeqCst) + by)
    }

    fn touch(&self) -> Result<SelfRef> {
        Ok(SelfRef::receiver())
    }
}

interpose::impl_target!(Clerk => GreeterCapability, CounterCapability);

#[derive(Default)]
struct Tally {
    total: AtomicI64,
}

impl Counter for Tally {
    fn increment(&self, by: i64) -> Result<i64> {
        Ok(self.total.fetch_add(by, Ordering::SeqCst) + 100 * by)
    }

    fn touch(&self) -> Result<SelfRef> {
        Ok(SelfRef::receiver())
    }
}

interpose::impl_target!(Tally => CounterCapability);

/// Greeter whose own object methods always fail
#[derive(Default)]
struct Brittle {
    object_calls: AtomicUsize,
}

impl Greeter for Brittle {
    fn name(&self) -> Result<String> {
        Ok("Brittle".to_string())
    }

    fn greet(&self, whom: String) -> Result<String> {
        Ok(whom)
    }
}

impl Target for Brittle {
    fn capabilities(&self) -> Vec<Capability> {
        vec![GreeterCapability::descriptor(), Capability::OBJECT]
    }

    fn invoke(&self, method: &Method, args: &mut Arguments) -> Result<Value> {
        if method.capability() == Capability::OBJECT.name() {
            self.object_calls.fetch_add(1, Ordering::SeqCst);
            return Err(Fault::new(&RUNTIME_EXCEPTION, "object method on target").into());
        }
        GreeterCapability::dispatch(self, method, args)
    }
}

/// Account that reports the running invocation through the exposure API
struct Vault {
    balance: AtomicI64,
}

impl Account for Vault {
    fn withdraw(&self, amount: i64) -> Result<i64> {
        let current = interpose::current_invocation()?;
        assert_eq!(current.method().name(), "withdraw");

        if amount < 0 {
            return Err(Fault::new(&INSUFFICIENT_FUNDS, "negative withdrawal").into());
        }
        if amount > self.balance.load(Ordering::SeqCst) {
            TransactionInterceptor::current_status()?.set_rollback_only();
        }
        Ok(self.balance.fetch_sub(amount, Ordering::SeqCst) - amount)
    }
}

interpose::impl_target!(Vault => AccountCapability);

/// Greeter failing on its first call only
struct Flaky {
    calls: AtomicUsize,
}

impl Greeter for Flaky {
    fn name(&self) -> Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Fault::new(&RUNTIME_EXCEPTION, "transient").into());
        }
        Ok("Ann".to_string())
    }

    fn greet(&self, whom: String) -> Result<String> {
        Ok(whom)
    }
}

interpose::impl_target!(Flaky => GreeterCapability);

struct Recorder {
    label: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn new(label: impl Into<String>, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.into(),
            log: Arc::clone(log),
        }
    }
}

impl Interceptor for Recorder {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        let method = invocation.method().name();
        self.log.lock().push(format!("enter {} {}", self.label, method));
        let result = invocation.proceed();
        self.log.lock().push(format!("exit {} {}", self.label, method));
        result
    }
}

#[derive(Default)]
struct RecordingManager {
    events: Mutex<Vec<&'static str>>,
}

impl TransactionManager for RecordingManager {
    fn begin(&self, _attribute: &RuleBasedTransactionAttribute) -> Result<TransactionStatus> {
        self.events.lock().push("begin");
        Ok(TransactionStatus::new(true))
    }

    fn commit(&self, _status: &TransactionStatus) -> Result<()> {
        self.events.lock().push("commit");
        Ok(())
    }

    fn rollback(&self, _status: &TransactionStatus) -> Result<()> {
        self.events.lock().push("rollback");
        Ok(())
    }
}

fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock()
        .iter()
        .filter(|entry| entry.starts_with("enter"))
        .cloned()
        .collect()
}

proptest! {
    #[test]
    fn test_advice_runs_once_in_list_order(count in 1usize..12) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut factory = ProxyFactory::new(Person::new("Ann"));
        for i in 0..count {
            factory = factory.with_interceptor(Recorder::new(i.to_string(), &log)).unwrap();
        }
        let proxy = factory.proxy().unwrap();

        prop_assert_eq!(proxy.name().unwrap(), "Ann");
        let expected: Vec<String> = (0..count).map(|i| format!("enter {} name", i)).collect();
        prop_assert_eq!(entries(&log), expected);
    }

    #[test]
    fn test_positional_inserts_follow_list_semantics(positions in prop::collection::vec(0usize..8, 1..8)) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let factory = ProxyFactory::new(Person::new("Ann"));
        let mut model: Vec<String> = Vec::new();

        for (label, position) in positions.into_iter().enumerate() {
            let position = position % (model.len() + 1);
            factory
                .config()
                .add_interceptor_at(position, Recorder::new(label.to_string(), &log))
                .unwrap();
            model.insert(position, format!("enter {} name", label));
        }

        factory.proxy().unwrap().name().unwrap();
        prop_assert_eq!(entries(&log), model);
    }
}

#[test]
fn test_proceed_after_exhaustion_keeps_index() {
    struct DoubleProceed {
        observed: Arc<Mutex<Vec<(Option<usize>, Option<usize>, bool)>>>,
    }

    impl Interceptor for DoubleProceed {
        fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
            let first = invocation.proceed()?;
            let before = invocation.current_index();
            let exhausted = matches!(invocation.proceed(), Err(AopError::ChainExhausted { .. }));
            self.observed
                .lock()
                .push((before, invocation.current_index(), exhausted));
            Ok(first)
        }
    }

    let observed = Arc::new(Mutex::new(Vec::new()));
    let proxy = ProxyFactory::new(Person::new("Ann"))
        .with_interceptor(DoubleProceed {
            observed: Arc::clone(&observed),
        })
        .unwrap()
        .proxy()
        .unwrap();

    assert_eq!(proxy.name().unwrap(), "Ann");
    assert_eq!(*observed.lock(), vec![(Some(1), Some(1), true)]);
}

#[test]
fn test_object_methods_never_reach_target() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let person = Arc::new(Person::new("Ann"));
    let proxy = ProxyFactory::with_target(person.clone())
        .with_interceptor(Recorder::new("outer", &log))
        .unwrap()
        .proxy()
        .unwrap();

    let description = proxy.to_string();
    assert!(description.contains("app.Greeter"));
    assert_eq!(
        proxy.invoke(&Method::TO_STRING, Arguments::empty()).unwrap(),
        Value::Str(description)
    );
    proxy.invoke(&Method::HASH_CODE, Arguments::empty()).unwrap();
    proxy
        .invoke(
            &Method::EQUALS,
            Arguments::new(vec![Value::Object(proxy.as_object())]),
        )
        .unwrap();

    assert_eq!(person.calls.load(Ordering::SeqCst), 0);
    assert!(log.lock().is_empty());
}

#[test]
fn test_object_methods_survive_failing_target() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let brittle = Arc::new(Brittle::default());
    let proxy = ProxyFactory::with_target(brittle.clone())
        .with_interceptor(Recorder::new("outer", &log))
        .unwrap()
        .proxy()
        .unwrap();

    let direct = brittle.invoke(&Method::TO_STRING, &mut Arguments::empty());
    assert!(direct.unwrap_err().is_target_fault());
    brittle.object_calls.store(0, Ordering::SeqCst);

    assert_eq!(
        proxy.invoke(&Method::TO_STRING, Arguments::empty()).unwrap(),
        Value::Str(proxy.to_string())
    );
    assert!(matches!(
        proxy.invoke(&Method::HASH_CODE, Arguments::empty()).unwrap(),
        Value::Int(_)
    ));
    assert_eq!(
        proxy
            .invoke(
                &Method::EQUALS,
                Arguments::new(vec![Value::Object(proxy.as_object())]),
            )
            .unwrap(),
        Value::Bool(true)
    );

    assert_eq!(brittle.object_calls.load(Ordering::SeqCst), 0);
    assert!(log.lock().is_empty());
    assert_eq!(proxy.name().unwrap(), "Brittle");
}

#[test]
fn test_proxy_equality() {
    let person: interpose::ObjectRef = Arc::new(Person::new("Ann"));
    let first = ProxyFactory::with_target(person.clone())
        .with_interceptor(TracingInterceptor::new())
        .unwrap()
        .proxy()
        .unwrap();
    let second = ProxyFactory::with_target(person.clone())
        .with_interceptor(TracingInterceptor::new())
        .unwrap()
        .proxy()
        .unwrap();

    assert_eq!(first, first);
    assert!(first == *first.advised());
    assert!(first != person);
    assert_ne!(first, second);

    let equals = first
        .invoke(&Method::EQUALS, Arguments::new(vec![Value::Object(person)]))
        .unwrap();
    assert_eq!(equals, Value::Bool(false));

    let equals = first
        .invoke(
            &Method::EQUALS,
            Arguments::new(vec![Value::Object(second.as_object())]),
        )
        .unwrap();
    assert_eq!(equals, Value::Bool(false));
}

#[test]
fn test_introduction_wins_over_target() {
    let proxy = ProxyFactory::new(Clerk::default())
        .with_introduction(DelegatingIntroduction::new(Tally::default()))
        .unwrap()
        .proxy()
        .unwrap();

    // Tally answers 100x, Clerk 1x
    assert_eq!(proxy.increment(1).unwrap(), 100);
    assert_eq!(proxy.name().unwrap(), "Clerk");
    assert!(proxy.touch().unwrap().refers_to(&proxy));
}

#[test]
fn test_suppression_visible_only_to_later_proxies() {
    let introduction = Arc::new(DelegatingIntroduction::new(Tally::default()));
    let factory = ProxyFactory::new(Person::new("Ann"))
        .with_advice(interpose::Advice::Introduction(introduction.clone()))
        .unwrap();

    let before = factory.proxy().unwrap();
    assert_eq!(before.increment(1).unwrap(), 100);
    introduction.suppress_capability("app.Counter");
    let after = factory.proxy().unwrap();

    assert!(before.implements("app.Counter"));
    assert!(!after.implements("app.Counter"));
    // Tally keeps answering the proxy built before suppression
    assert_eq!(before.increment(1).unwrap(), 101);
    assert!(before.touch().unwrap().refers_to(&before));
    assert!(matches!(
        after.increment(1),
        Err(AopError::UnsupportedCapability(_))
    ));
}

#[test]
fn test_suppression_keeps_delegate_for_shared_capability() {
    let introduction = Arc::new(DelegatingIntroduction::new(Tally::default()));
    let factory = ProxyFactory::new(Clerk::default())
        .with_advice(interpose::Advice::Introduction(introduction.clone()))
        .unwrap();

    let before = factory.proxy().unwrap();
    assert_eq!(before.increment(1).unwrap(), 100);
    introduction.suppress_capability("app.Counter");
    let after = factory.proxy().unwrap();

    // Both proxies expose the capability through Clerk, but only the new
    // one routes it there
    assert!(after.implements("app.Counter"));
    assert_eq!(before.increment(1).unwrap(), 101);
    assert_eq!(after.increment(1).unwrap(), 1);
}

#[test]
fn test_closest_rollback_rule_wins() {
    let attribute = RuleBasedTransactionAttribute::new()
        .with_rule(RollbackRule::rollback_on("lang.RuntimeException"))
        .with_rule(RollbackRule::no_rollback_on("lang.Exception"));
    let fault = Fault::new(&EJB_EXCEPTION, "remote failure");

    assert_eq!(attribute.rules[0].depth(fault.class()), Some(1));
    assert_eq!(attribute.rules[1].depth(fault.class()), Some(2));
    assert!(attribute.rollback_on(&fault));

    let unmatched = RuleBasedTransactionAttribute::new()
        .with_rule(RollbackRule::rollback_on("sql."));
    assert!(unmatched.rollback_on(&fault));
    assert!(!unmatched.rollback_on(&Fault::new(&INSUFFICIENT_FUNDS, "x")));
}

#[test]
fn test_greeter_with_logging_advice() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let proxy = ProxyFactory::new(Person::new("Ann"))
        .with_interceptor(TracingInterceptor::new())
        .unwrap()
        .with_interceptor(Recorder::new("log", &log))
        .unwrap()
        .proxy()
        .unwrap();

    assert_eq!(proxy.name().unwrap(), "Ann");
    assert_eq!(*log.lock(), vec!["enter log name", "exit log name"]);
}

#[test]
fn test_nothing_after_forwarding_advice() {
    let next = ProxyFactory::new(Person::new("Ann"))
        .with_interceptor(TracingInterceptor::new())
        .unwrap()
        .proxy()
        .unwrap();
    let factory = ProxyFactory::without_target()
        .with_capability(GreeterCapability::descriptor())
        .with_interceptor(TracingInterceptor::with_label("front"))
        .unwrap()
        .with_interceptor(ProxyForwarder::new(next))
        .unwrap();

    let before: Vec<String> = factory
        .config()
        .advice()
        .iter()
        .map(|advice| advice.name().to_string())
        .collect();

    let result = factory.config().add_interceptor(TracingInterceptor::new());
    assert!(matches!(result, Err(AopError::UnreachableAdvice { .. })));

    let after: Vec<String> = factory
        .config()
        .advice()
        .iter()
        .map(|advice| advice.name().to_string())
        .collect();
    assert_eq!(before, after);
    assert_eq!(factory.proxy().unwrap().name().unwrap(), "Ann");
}

#[test]
fn test_transaction_with_exposed_invocation() {
    let manager = Arc::new(RecordingManager::default());
    let attributes = Arc::new(MethodMapAttributeRegistry::new());
    attributes.add("bank.Account.*", RuleBasedTransactionAttribute::new());

    let proxy = ProxyFactory::new(Vault {
        balance: AtomicI64::new(50),
    })
    .with_interceptor(TransactionInterceptor::new(manager.clone(), attributes))
    .unwrap()
    .with_expose_invocation(true)
    .proxy()
    .unwrap();

    assert_eq!(proxy.withdraw(20).unwrap(), 30);
    // Overdraft marks the transaction rollback-only but still returns
    assert_eq!(proxy.withdraw(40).unwrap(), -10);
    // Checked fault commits by default
    let err = proxy.withdraw(-1).unwrap_err();
    assert_eq!(err.fault().unwrap().class().name(), "bank.InsufficientFunds");

    assert_eq!(
        *manager.events.lock(),
        vec!["begin", "commit", "begin", "rollback", "begin", "commit"]
    );
    assert!(interpose::current_invocation().is_err());
}

#[test]
fn test_exposure_disabled_by_default() {
    let manager = Arc::new(RecordingManager::default());
    let attributes = Arc::new(MethodMapAttributeRegistry::new());
    attributes.add("bank.*", RuleBasedTransactionAttribute::new());

    let proxy = ProxyFactory::new(Vault {
        balance: AtomicI64::new(50),
    })
    .with_interceptor(TransactionInterceptor::new(manager.clone(), attributes))
    .unwrap()
    .proxy()
    .unwrap();

    assert!(matches!(
        proxy.withdraw(1),
        Err(AopError::NoCurrentInvocation)
    ));
    assert_eq!(*manager.events.lock(), vec!["begin", "rollback"]);
}

#[test]
fn test_retry_through_invocable_clone() {
    struct RetryOnce;

    impl Interceptor for RetryOnce {
        fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
            let mut attempt = invocation.invocable_clone();
            match attempt.proceed() {
                Err(err) if err.is_target_fault() => invocation.proceed(),
                other => other,
            }
        }
    }

    let proxy = ProxyFactory::new(Flaky {
        calls: AtomicUsize::new(0),
    })
    .with_interceptor(RetryOnce)
    .unwrap()
    .proxy()
    .unwrap();

    assert_eq!(proxy.name().unwrap(), "Ann");
}

#[test]
fn test_arguments_rewritten_by_advice() {
    struct Shout;

    impl Interceptor for Shout {
        fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
            if let Some(Value::Str(whom)) = invocation.arguments().get(0).cloned() {
                invocation
                    .arguments_mut()
                    .set(0, Value::Str(whom.to_uppercase()))?;
            }
            invocation.proceed()
        }
    }

    let proxy = ProxyFactory::new(Person::new("Ann"))
        .with_interceptor(Shout)
        .unwrap()
        .proxy()
        .unwrap();

    assert_eq!(proxy.greet("bob".to_string()).unwrap(), "Hello BOB, I am Ann");
}
