//! A facade shared between threads: registry changes and broadcasts are
//! serialized, and paired registry entries never come apart.

use anyhow::Result;
use puremvc::core::{BindingTable, BoundMediator, Command, MediatorCore, Notification};
use puremvc::{Facade, FacadeConfig, HandlerResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Count(Arc<AtomicUsize>);

impl Command for Count {
    fn execute(&self, _facade: &Facade, _note: &mut Notification) -> HandlerResult {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Tracks how many of its handlers are running at once.
struct Slow {
    core: MediatorCore,
    active: AtomicUsize,
    peak: AtomicUsize,
    removals: AtomicUsize,
}

impl Slow {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            core: MediatorCore::new(name),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
        })
    }

    fn on_work(&self, _note: &mut Notification) -> HandlerResult {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl BoundMediator for Slow {
    fn core(&self) -> &MediatorCore {
        &self.core
    }

    fn bindings() -> BindingTable<Self> {
        BindingTable::new("Slow").bind("Work", "on_work", Self::on_work)
    }

    fn on_remove(&self) {
        self.removals.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_command_route_and_observer_change_together() -> Result<()> {
    init_logger();
    let facade = Facade::new(FacadeConfig::default());
    let runs = Arc::new(AtomicUsize::new(0));

    for round in 0..500 {
        let barrier = Arc::new(Barrier::new(2));

        let registering = {
            let (facade, runs, barrier) = (facade.clone(), runs.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                let _ = facade.register_command("S", move || Count(runs.clone()));
            })
        };
        let removing = {
            let (facade, barrier) = (facade.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                facade.remove_command("S");
            })
        };
        registering.join().expect("register thread");
        removing.join().expect("remove thread");

        let routed = facade.has_command("S");
        let observers = facade.view().observer_count("S");
        assert_eq!(
            observers,
            usize::from(routed),
            "round {}: route {} with {} observer(s)",
            round,
            routed,
            observers
        );

        if !routed {
            let runs = runs.clone();
            facade.register_command("S", move || Count(runs.clone()))?;
        }
        let before = runs.load(Ordering::SeqCst);
        facade.send_notification("S", None, None)?;
        assert_eq!(runs.load(Ordering::SeqCst), before + 1, "round {}", round);

        assert!(facade.remove_command("S"));
    }
    Ok(())
}

#[test]
fn test_concurrent_removal_runs_hook_once() -> Result<()> {
    init_logger();
    let facade = Facade::new(FacadeConfig::default());

    for _ in 0..100 {
        let mediator = Slow::new("Target");
        facade.register_mediator(mediator.clone())?;

        let barrier = Arc::new(Barrier::new(4));
        let removers: Vec<_> = (0..4)
            .map(|_| {
                let (facade, barrier) = (facade.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    facade.remove_mediator("Target").is_some()
                })
            })
            .collect();

        let mut removed = 0;
        for remover in removers {
            if remover.join().expect("remove thread") {
                removed += 1;
            }
        }

        assert_eq!(removed, 1);
        assert_eq!(mediator.removals.load(Ordering::SeqCst), 1);
        assert!(!facade.has_mediator("Target"));
        assert_eq!(facade.view().observer_count("Work"), 0);
    }
    Ok(())
}

#[test]
fn test_broadcasts_from_many_threads_run_one_at_a_time() -> Result<()> {
    init_logger();
    let facade = Facade::new(FacadeConfig::default());
    let slow = Slow::new("Slow");
    facade.register_mediator(slow.clone())?;

    let barrier = Arc::new(Barrier::new(4));
    let senders: Vec<_> = (0..4)
        .map(|_| {
            let (facade, barrier) = (facade.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                facade.send_notification("Work", None, None)
            })
        })
        .collect();
    for sender in senders {
        sender.join().expect("send thread")?;
    }

    assert_eq!(slow.peak.load(Ordering::SeqCst), 1);
    assert!(!facade.registry_lock().is_locked());
    Ok(())
}

#[test]
fn test_nested_send_while_other_threads_send() -> Result<()> {
    struct Relay {
        core: MediatorCore,
        inner: AtomicUsize,
    }

    impl Relay {
        fn on_outer(&self, _note: &mut Notification) -> HandlerResult {
            self.core.notifier().send_notification("Inner", None, None)?;
            Ok(())
        }

        fn on_inner(&self, _note: &mut Notification) -> HandlerResult {
            self.inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl BoundMediator for Relay {
        fn core(&self) -> &MediatorCore {
            &self.core
        }

        fn bindings() -> BindingTable<Self> {
            BindingTable::new("Relay")
                .bind("Outer", "on_outer", Self::on_outer)
                .bind("Inner", "on_inner", Self::on_inner)
        }
    }

    let facade = Facade::new(FacadeConfig::default());
    let relay = Arc::new(Relay {
        core: MediatorCore::new("Relay"),
        inner: AtomicUsize::new(0),
    });
    facade.register_mediator(relay.clone())?;

    let senders: Vec<_> = (0..4)
        .map(|_| {
            let facade = facade.clone();
            thread::spawn(move || -> Result<()> {
                for _ in 0..25 {
                    facade.send_notification("Outer", None, None)?;
                }
                Ok(())
            })
        })
        .collect();
    for sender in senders {
        sender.join().expect("send thread")?;
    }

    assert_eq!(relay.inner.load(Ordering::SeqCst), 100);
    Ok(())
}
